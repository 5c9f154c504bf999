/// Format agorot as shekels with thousands separators: ₪1,234.56
pub fn shekels(agorot: i64) -> String {
    let negative = agorot < 0;
    let abs = agorot.unsigned_abs();
    let int_part = (abs / 100).to_string();
    let dec_part = abs % 100;

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-₪{with_commas}.{dec_part:02}")
    } else {
        format!("₪{with_commas}.{dec_part:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shekel_formatting() {
        assert_eq!(shekels(123_456), "₪1,234.56");
        assert_eq!(shekels(-50_000), "-₪500.00");
        assert_eq!(shekels(0), "₪0.00");
        assert_eq!(shekels(100_000_099), "₪1,000,000.99");
        assert_eq!(shekels(4_210), "₪42.10");
        assert_eq!(shekels(-5), "-₪0.05");
    }
}
