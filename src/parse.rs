//! Exact fixed-point parsing of `D.D`, `DD.D`, `-D.D` and `-DD.D`.

#[inline(always)]
fn digit(b: u8) -> Option<i16> {
    b.is_ascii_digit().then(|| (b - b'0') as i16)
}

/// Parse a reading into its value multiplied by ten.
///
/// Returns `None` for anything that is not one of the four accepted shapes.
/// No floating point is involved, so summing the results is exact.
#[inline]
pub fn parse_scaled(bytes: &[u8]) -> Option<i16> {
    let (neg, int) = match bytes {
        [b'-', rest @ ..] => (true, rest),
        _ => (false, bytes),
    };

    let magnitude = match int {
        &[a, b'.', f] => digit(a)? * 10 + digit(f)?,
        &[a, b, b'.', f] => digit(a)? * 100 + digit(b)? * 10 + digit(f)?,
        _ => return None,
    };

    Some(if neg { -magnitude } else { magnitude })
}
