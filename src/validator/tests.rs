use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use proptest::prelude::*;

use super::*;
use crate::deliverability::tests::StubResolver;
use crate::deliverability::{
    DnsLookupError, DnsResolver, MxFallbackType, MxRecord, UndeliverableError,
    UnknownDeliverability,
};

fn offline() -> ValidationOptions {
    ValidationOptions::default().with_deliverability(false)
}

fn valid(email: &str) -> ValidatedEmail {
    validate_email(email, &offline()).unwrap_or_else(|err| panic!("{email}: {err}"))
}

fn syntax_error(email: &str, options: &ValidationOptions) -> SyntaxError {
    match validate_email(email, options) {
        Err(EmailError::Syntax(err)) => err,
        other => panic!("{email}: expected a syntax error, got {other:?}"),
    }
}

fn undeliverable(email: &str, options: &ValidationOptions) -> UndeliverableError {
    match validate_email(email, options) {
        Err(EmailError::Undeliverable(err)) => err,
        other => panic!("{email}: expected an undeliverable error, got {other:?}"),
    }
}

/// Fails the test if any DNS query is issued.
fn unreachable_resolver() -> DnsResolver {
    DnsResolver::new(
        StubResolver::new()
            .with_mx(|domain| panic!("unexpected MX query for {domain}"))
            .with_a(|domain| panic!("unexpected A query for {domain}")),
    )
}

#[test]
fn plain_ascii_address() {
    let email = valid("Me.Myself@example.org");
    assert_eq!(email.original, "Me.Myself@example.org");
    assert_eq!(email.local_part, "Me.Myself");
    assert_eq!(email.ascii_local_part.as_deref(), Some("Me.Myself"));
    assert_eq!(email.domain, "example.org");
    assert_eq!(email.ascii_domain.as_deref(), Some("example.org"));
    assert_eq!(email.normalized, "Me.Myself@example.org");
    assert_eq!(email.ascii_email.as_deref(), Some("Me.Myself@example.org"));
    assert!(!email.smtputf8);
    assert!(!email.is_domain_literal());
    assert_eq!(email.mx, None);
}

#[test]
fn domain_is_lowercased() {
    assert_eq!(valid("me@EXAMPLE.Org").normalized, "me@example.org");
}

#[test]
fn dot_atom_positions() {
    let opts = offline();
    assert_eq!(
        syntax_error(".user@example.com", &opts),
        SyntaxError::DotAtom(DotAtomViolation::LocalStartsWith(Separator::Period))
    );
    assert_eq!(
        syntax_error("user.@example.com", &opts),
        SyntaxError::DotAtom(DotAtomViolation::LocalEndsWith(Separator::Period))
    );
    assert_eq!(
        syntax_error("user..name@example.com", &opts),
        SyntaxError::DotAtom(DotAtomViolation::ConsecutivePeriods)
    );
    assert_eq!(valid("user.name@example.com").local_part, "user.name");

    insta::assert_snapshot!(
        syntax_error(".user@example.com", &opts).to_string(),
        @"An email address cannot start with a period."
    );
    insta::assert_snapshot!(
        syntax_error("user@example.com.", &opts).to_string(),
        @"An email address cannot end with a period."
    );
}

#[test]
fn local_part_length_boundary() {
    let at_limit = format!("{}@example.com", "a".repeat(64));
    assert_eq!(valid(&at_limit).local_part.len(), 64);

    let over = format!("{}@example.com", "a".repeat(65));
    let err = syntax_error(&over, &offline());
    assert_eq!(err, SyntaxError::LocalPartTooLong { excess: 1 });
    insta::assert_snapshot!(err.to_string(), @"The email address is too long before the @-sign (1 character too many).");
}

#[test]
fn total_length_is_checked() {
    let domain = format!("{0}.{1}.{2}.com", "b".repeat(63), "c".repeat(63), "d".repeat(63));
    let email = format!("{}@{domain}", "a".repeat(64));
    let err = syntax_error(&email, &offline());
    assert_eq!(
        err,
        SyntaxError::TooLong {
            excess: TotalLengthExcess::Characters(6)
        }
    );
    insta::assert_snapshot!(err.to_string(), @"The email address is too long (6 characters too many).");
}

#[test]
fn internationalized_address() {
    let email = valid("伊昭傑@郵件.商務");
    assert_eq!(email.local_part, "伊昭傑");
    assert_eq!(email.ascii_local_part, None);
    assert_eq!(email.domain, "郵件.商務");
    assert_eq!(email.ascii_domain.as_deref(), Some("xn--5nqv22n.xn--lhr59c"));
    assert_eq!(email.normalized, "伊昭傑@郵件.商務");
    assert_eq!(email.ascii_email, None);
    assert!(email.smtputf8);
}

#[test]
fn internationalized_domain_keeps_ascii_email() {
    let email = valid("me@郵件.商務");
    assert!(!email.smtputf8);
    assert_eq!(
        email.ascii_email.as_deref(),
        Some("me@xn--5nqv22n.xn--lhr59c")
    );
}

#[test]
fn smtputf8_can_be_refused() {
    let opts = offline().with_smtputf8(false);
    assert!(matches!(
        syntax_error("伊昭傑@郵件.商務", &opts),
        SyntaxError::InternationalizedLocalPart { .. }
    ));
    // the domain never needs SMTPUTF8
    assert!(validate_email("me@郵件.商務", &opts).is_ok());
}

#[test]
fn at_sign_problems() {
    let opts = offline();
    assert_eq!(syntax_error("me.example.com", &opts), SyntaxError::NoAtSign);
    assert_eq!(
        syntax_error("me\u{FF20}example.com", &opts),
        SyntaxError::FullWidthAtSign
    );
    assert_eq!(
        syntax_error("me@you@example.com", &opts),
        SyntaxError::MultipleAtSigns
    );
}

#[test]
fn empty_parts() {
    let opts = offline();
    assert_eq!(syntax_error("@example.com", &opts), SyntaxError::LocalPartEmpty);
    assert_eq!(syntax_error("me@", &opts), SyntaxError::DomainEmpty);

    let email = validate_email("@example.com", &opts.clone().with_empty_local(true)).unwrap();
    assert_eq!(email.local_part, "");
    assert_eq!(email.normalized, "@example.com");
}

#[test]
fn unsafe_characters_are_rejected() {
    let err = syntax_error("me\u{200B}@example.com", &offline());
    match err {
        SyntaxError::UnsafeCharacters { chars } => assert_eq!(chars.chars(), &['\u{200B}']),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn reserved_mailbox_names_are_lowercased() {
    let email = valid("POSTMASTER@example.com");
    assert_eq!(email.local_part, "postmaster");
    assert_eq!(email.ascii_local_part.as_deref(), Some("postmaster"));
    assert_eq!(email.normalized, "postmaster@example.com");

    assert_eq!(valid("Abuse@example.com").local_part, "abuse");
    // other local parts keep their case
    assert_eq!(valid("PostMasters@example.com").local_part, "PostMasters");
}

#[test]
fn display_names() {
    let opts = offline();
    assert_eq!(
        syntax_error("My Name <me@example.com>", &opts),
        SyntaxError::DisplayNameNotAllowed
    );
    assert_eq!(
        syntax_error("<me@example.com>", &opts),
        SyntaxError::DisplayNameNotAllowed
    );

    let opts = opts.with_display_name(true);
    let email = validate_email("My Name <me@example.com>", &opts).unwrap();
    assert_eq!(email.display_name.as_deref(), Some("My Name"));
    assert_eq!(email.original, "My Name <me@example.com>");
    assert_eq!(email.normalized, "me@example.com");

    let email = validate_email(r#""Doe, Jane" <jane@example.com>"#, &opts).unwrap();
    assert_eq!(email.display_name.as_deref(), Some("Doe, Jane"));
}

#[test]
fn quoted_local_parts() {
    let opts = offline();
    assert_eq!(
        syntax_error(r#""John Doe"@example.com"#, &opts),
        SyntaxError::QuotedLocalPartNotAllowed
    );
    // unnecessary quotes still need permission
    assert_eq!(
        syntax_error(r#""me"@example.com"#, &opts),
        SyntaxError::QuotedLocalPartNotAllowed
    );

    let opts = opts.with_quoted_local(true);
    let email = validate_email(r#""John Doe"@example.com"#, &opts).unwrap();
    assert_eq!(email.local_part, r#""John Doe""#);
    assert_eq!(email.normalized, r#""John Doe"@example.com"#);

    let email = validate_email(r#""me"@example.com"#, &opts).unwrap();
    assert_eq!(email.normalized, "me@example.com");

    let email = validate_email(r#""a@b"@example.com"#, &opts).unwrap();
    assert_eq!(email.local_part, r#""a@b""#);
}

#[test]
fn quoted_local_part_errors_win_over_permission() {
    // the content is checked before the quoting permission
    assert!(matches!(
        syntax_error("\"a\u{0}b\"@example.com", &offline()),
        SyntaxError::InvalidQuotedCharacters { .. }
    ));
}

#[test]
fn domain_literals() {
    let opts = offline();
    assert_eq!(
        syntax_error("me@[127.0.0.1]", &opts),
        SyntaxError::DomainLiteralNotAllowed
    );

    let opts = opts.with_domain_literal(true);
    let email = validate_email("me@[127.0.0.1]", &opts).unwrap();
    assert_eq!(email.domain, "[127.0.0.1]");
    assert_eq!(email.ascii_domain, None);
    assert_eq!(
        email.domain_address,
        Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)))
    );
    assert_eq!(email.normalized, "me@[127.0.0.1]");
    assert_eq!(email.ascii_email.as_deref(), Some("me@[127.0.0.1]"));
    assert!(email.is_domain_literal());

    let email = validate_email("me@[IPv6:::1]", &opts).unwrap();
    assert_eq!(email.domain, "[IPv6:::1]");
    assert_eq!(email.domain_address, Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));

    let email = validate_email("me@[IPv6:2001:DB8:0:0:0:0:0:1]", &opts).unwrap();
    assert_eq!(email.domain, "[IPv6:2001:db8::1]");

    assert_eq!(
        syntax_error("me@[ipv6:2001:db8::1]", &opts),
        SyntaxError::UnsupportedLiteralTag
    );
}

#[test]
fn malformed_literal_reported_before_permission() {
    assert!(matches!(
        syntax_error("me@[127.0.0.256]", &offline()),
        SyntaxError::InvalidIpv4Literal { .. }
    ));
}

#[test]
fn literals_skip_deliverability() {
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_domain_literal(true)
        .with_resolver(unreachable_resolver());
    let email = validate_email("me@[192.0.2.1]", &opts).unwrap();
    assert_eq!(email.mx, None);
}

#[test]
fn reserved_domains_never_succeed() {
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_resolver(DnsResolver::new(StubResolver::null_mx()));
    let err = undeliverable("me@example.com", &opts);
    insta::assert_snapshot!(err.to_string(), @"The domain name example.com does not accept email.");

    let opts = ValidationOptions::default().with_resolver(DnsResolver::new(
        StubResolver::new().with_mx(|_| Err(DnsLookupError::NxDomain)),
    ));
    let err = undeliverable("me@mail.example", &opts.clone().with_deliverability(true));
    insta::assert_snapshot!(err.to_string(), @"The domain name mail.example does not exist.");

    assert_eq!(
        syntax_error("me@test.test.test", &opts),
        SyntaxError::SpecialUseDomain
    );
}

#[test]
fn test_environment_allows_test_domains() {
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_test_environment(true)
        .with_resolver(unreachable_resolver());
    let email = validate_email("me@test.test.test", &opts).unwrap();
    assert_eq!(email.domain, "test.test.test");
    assert_eq!(email.mx, None);

    assert!(validate_email("me@test", &opts).is_ok());
    assert_eq!(
        syntax_error("me@mail.localhost", &opts),
        SyntaxError::SpecialUseDomain
    );
}

#[test]
fn global_deliverability_rules() {
    let opts = offline();
    assert_eq!(syntax_error("me@com", &opts), SyntaxError::DomainNoPeriod);
    assert_eq!(
        syntax_error("me@example.123", &opts),
        SyntaxError::DomainInvalidTld
    );

    let opts = opts.with_globally_deliverable(false);
    assert_eq!(validate_email("me@com", &opts).unwrap().domain, "com");
}

#[test]
fn allowed_top_level_domains() {
    let opts = offline().with_allowed_top_level_domains(["com", ".ORG"]);
    assert!(validate_email("me@example.com", &opts).is_ok());
    assert!(validate_email("me@example.org", &opts).is_ok());
    assert_eq!(
        syntax_error("me@example.net", &opts),
        SyntaxError::DomainTldNotAllowed
    );
}

#[test]
fn deliverability_metadata_is_merged() {
    let resolver = StubResolver::new().with_mx(|_| {
        Ok(vec![
            MxRecord::new(20, "mx2.example.org."),
            MxRecord::new(10, "mx1.example.org."),
        ])
    });
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_resolver(DnsResolver::new(resolver));
    let email = validate_email("me@example.org", &opts).unwrap();
    assert_eq!(
        email.mx,
        Some(vec![
            MxRecord::new(10, "mx1.example.org"),
            MxRecord::new(20, "mx2.example.org"),
        ])
    );
    assert_eq!(email.mx_fallback_type, None);
    assert_eq!(email.unknown_deliverability, None);

    let resolver = StubResolver::new()
        .with_a(|_| Ok(vec![Ipv4Addr::new(93, 184, 216, 34)]))
        .with_txt(|_| Ok(vec!["v=spf1 mx ~all".to_string()]));
    let opts = opts.with_resolver(DnsResolver::new(resolver));
    let email = validate_email("me@example.org", &opts).unwrap();
    assert_eq!(email.mx, Some(vec![MxRecord::new(0, "example.org")]));
    assert_eq!(email.mx_fallback_type, Some(MxFallbackType::A));
    assert_eq!(email.spf.as_deref(), Some("v=spf1 mx ~all"));
}

#[test]
fn deliverability_uses_ascii_domain() {
    let resolver = StubResolver::new().with_mx(|domain| {
        assert_eq!(domain, "xn--5nqv22n.xn--lhr59c");
        Ok(vec![MxRecord::new(10, "mx.xn--5nqv22n.xn--lhr59c")])
    });
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_resolver(DnsResolver::new(resolver));
    assert!(validate_email("me@郵件.商務", &opts).is_ok());
}

#[test]
fn transient_dns_failure_is_not_an_error() {
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_resolver(DnsResolver::new(
            StubResolver::new().with_mx(|_| Err(DnsLookupError::Timeout)),
        ));
    let email = validate_email("me@example.org", &opts).unwrap();
    assert_eq!(
        email.unknown_deliverability,
        Some(UnknownDeliverability::Timeout)
    );
    assert_eq!(email.mx, None);
}

#[test]
fn syntax_errors_never_query_dns() {
    let opts = ValidationOptions::default()
        .with_deliverability(true)
        .with_resolver(unreachable_resolver());
    let err = validate_email("me@@example.org", &opts).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn byte_input_must_be_ascii() {
    let email = validate_email_bytes(b"me@example.org", &offline()).unwrap();
    assert_eq!(email.normalized, "me@example.org");

    let err = validate_email_bytes("伊@example.org".as_bytes(), &offline()).unwrap_err();
    assert_eq!(err.as_syntax(), Some(&SyntaxError::NotAscii));
}

#[test]
fn diagnostics_snapshot() {
    let opts = offline();
    let inputs = [
        "me@example..com",
        "me@-example.com",
        "me@ex_ample.com",
        "me@xn--ab-.com",
        "me@ab--cd.com",
        "me@[1.2.3]",
        "me@[foo]",
        "me(comment)@example.com",
    ];
    let report: Vec<String> = inputs
        .iter()
        .map(|input| format!("{input} => {}", syntax_error(input, &opts)))
        .collect();
    insta::assert_snapshot!(report.join("\n"), @r"
    me@example..com => An email address cannot have two periods in a row.
    me@-example.com => An email address cannot have a hyphen immediately after the @-sign.
    me@ex_ample.com => The part after the @-sign contains invalid characters: '_'.
    me@xn--ab-.com => An email address cannot have a period and a hyphen next to each other.
    me@ab--cd.com => An email address cannot have two letters followed by two dashes immediately after the @-sign or after a period, except Punycode.
    me@[1.2.3] => The address in brackets after the @-sign is not valid: It is not an IPv4 address (Expected 4 octets in '1.2.3') or is missing an address literal tag.
    me@[foo] => The part after the @-sign in brackets is not an IPv4 address and has no address literal tag.
    me(comment)@example.com => The email address contains invalid characters before the @-sign: '(', ')'.
    ");
}

proptest! {
    #[test]
    fn never_panics(input in "\\PC{0,80}") {
        let _ = validate_email(&input, &offline());
    }

    #[test]
    fn normalized_form_is_a_fixed_point(
        local in "[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]{1,20}(\\.[a-z0-9]{1,8}){0,2}",
        domain in "[A-Za-z0-9]{1,12}(\\.[a-z0-9]{1,8})?\\.(com|ORG|net)",
    ) {
        let first = validate_email(&format!("{local}@{domain}"), &offline()).unwrap();
        let second = validate_email(&first.normalized, &offline()).unwrap();
        prop_assert_eq!(&second.normalized, &first.normalized);
        prop_assert_eq!(second.ascii_email, first.ascii_email);
    }

    #[test]
    fn internationalized_normalization_is_stable(local in "[a-zé伊昭傑]{1,10}") {
        let first = validate_email(&format!("{local}@郵件.商務"), &offline()).unwrap();
        let second = validate_email(&first.normalized, &offline()).unwrap();
        prop_assert_eq!(second.normalized, first.normalized);
    }
}
