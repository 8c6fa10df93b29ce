use super::*;

#[test]
fn clamp_token_is_identity_inside_range() {
    for id in [1i64, 2, 1000, 3332, 3333] {
        assert_eq!(i64::from(clamp_token(id)), id);
    }
}

#[test]
fn clamp_token_maps_outside_range_to_bounds() {
    assert_eq!(clamp_token(0), TOKEN_MIN);
    assert_eq!(clamp_token(-50), TOKEN_MIN);
    assert_eq!(clamp_token(i64::MIN), TOKEN_MIN);
    assert_eq!(clamp_token(3334), TOKEN_MAX);
    assert_eq!(clamp_token(9999), TOKEN_MAX);
    assert_eq!(clamp_token(i64::MAX), TOKEN_MAX);
}

#[test]
fn parse_token_handles_junk_and_fractions() {
    assert_eq!(parse_token("42"), 42);
    assert_eq!(parse_token("  7 "), 7);
    assert_eq!(parse_token(""), 1);
    assert_eq!(parse_token("abc"), 1);
    assert_eq!(parse_token("0"), 1);
    assert_eq!(parse_token("12.9"), 12);
    assert_eq!(parse_token("99999"), 3333);
    assert_eq!(parse_token("-4"), 1);
    assert_eq!(parse_token("NaN"), 1);
}
