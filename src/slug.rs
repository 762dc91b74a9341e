/// Lower-case ASCII slug: alphanumerics kept, every other run collapsed to one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hair Care & Oils"), "hair-care-oils");
        assert_eq!(slugify("  Kumkumadi   Tailam!! "), "kumkumadi-tailam");
        assert_eq!(slugify("Ayurveda 101"), "ayurveda-101");
        assert_eq!(slugify("***"), "");
    }
}
