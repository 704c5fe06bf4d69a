use uuid::Uuid;

/// A fresh credential slug: 32 lowercase hex characters of v4 randomness
pub fn generate_slug() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn generate_slugs(count: usize) -> Vec<String> {
    (0..count).map(|_| generate_slug()).collect()
}

/// Push a new slug to the front and retire the oldest one.
///
/// The list keeps its length, so the oldest credential stops working after
/// `len` rotations at most. An empty list gains its first slug.
pub fn rotate(slugs: &[String]) -> Vec<String> {
    let keep = slugs.len().max(1);
    let mut rotated = Vec::with_capacity(keep);
    rotated.push(generate_slug());
    rotated.extend(slugs.iter().take(keep - 1).cloned());
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_hex_and_distinct() {
        let slugs = generate_slugs(5);
        assert_eq!(slugs.len(), 5);
        for slug in &slugs {
            assert_eq!(slug.len(), 32);
            assert!(slug.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
        let mut unique = slugs.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), slugs.len());
    }

    #[test]
    fn rotation_drops_oldest() {
        let slugs = vec!["c".to_string(), "b".to_string(), "a".to_string()];
        let rotated = rotate(&slugs);

        assert_eq!(rotated.len(), 3);
        assert!(!slugs.contains(&rotated[0]));
        assert_eq!(&rotated[1..], &["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn rotating_empty_list_yields_one_slug() {
        assert_eq!(rotate(&[]).len(), 1);
    }
}
