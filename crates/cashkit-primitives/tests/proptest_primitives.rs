use proptest::prelude::*;

use cashkit_primitives::base58;
use cashkit_primitives::chainhash::Hash;
use cashkit_primitives::ec::private_key::PrivateKey;
use cashkit_primitives::ec::signature::Signature;
use cashkit_primitives::hash::sha256d;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signatures_verify_and_survive_der(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        // Not every 32-byte string is a valid scalar.
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let hash = sha256d(&msg);
            let sig = key.sign(&hash).unwrap();
            prop_assert!(key.pub_key().verify(&hash, &sig));

            let parsed = Signature::from_der(&sig.to_der()).unwrap();
            prop_assert_eq!(&parsed, &sig);
            // Signing is deterministic.
            prop_assert_eq!(key.sign(&hash).unwrap(), sig);
        }
    }

    #[test]
    fn wif_round_trip(seed in prop::array::uniform32(any::<u8>())) {
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            prop_assert_eq!(PrivateKey::from_wif(&key.to_wif()).unwrap(), key);
        }
    }

    #[test]
    fn base58check_round_trip(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let text = base58::check_encode(&payload);
        prop_assert_eq!(base58::check_decode(&text).unwrap(), payload);
    }

    #[test]
    fn hash_hex_round_trip(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(Hash::from_hex(&hash.to_string()).unwrap(), hash);
    }
}
