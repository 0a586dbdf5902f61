use rand::seq::SliceRandom;
use rand::Rng;

pub const ADJECTIVES: [&str; 7] = ["Neon", "Cyber", "Ghost", "Electric", "Silent", "Rapid", "Local"];
pub const ANIMALS: [&str; 7] = ["Yak", "Tiger", "Rhino", "Eagle", "Cobra", "Hawk", "Wolf"];

/// Ephemeral display handle such as "Ghost Yak"
///
/// Picked once per session. Collisions are possible and harmless.
pub fn anonymous_handle() -> String {
    anonymous_handle_with(&mut rand::thread_rng())
}

pub fn anonymous_handle_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or(ADJECTIVES[0]);
    let animal = ANIMALS.choose(rng).copied().unwrap_or(ANIMALS[0]);
    format!("{} {}", adjective, animal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_handle_shape() {
        let handle = anonymous_handle();
        let (adjective, animal) = handle.split_once(' ').unwrap();
        assert!(ADJECTIVES.contains(&adjective));
        assert!(ANIMALS.contains(&animal));
    }

    #[test]
    fn test_seeded_handles_repeat() {
        let first = anonymous_handle_with(&mut StdRng::seed_from_u64(7));
        let second = anonymous_handle_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }
}
