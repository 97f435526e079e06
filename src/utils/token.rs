use uuid::Uuid;

/// 赠送要约的不透明 token
pub fn generate_offer_token() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_offer_token();
        let b = generate_offer_token();
        assert_ne!(a, b);
    }
}
