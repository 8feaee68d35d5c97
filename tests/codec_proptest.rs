//! Property tests for the message body codec.

use aliyun_mns::codec::{decode, encode, message_body_md5, verify_message_body_md5};
use proptest::prelude::*;

proptest! {
    #[test]
    fn md5_is_uppercase_hex(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        let digest = message_body_md5(&body);
        prop_assert_eq!(digest.len(), 32);
        prop_assert!(digest.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        prop_assert_eq!(&digest, &message_body_md5(&body));
    }

    #[test]
    fn verify_accepts_any_case(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        let digest = message_body_md5(&body);
        prop_assert!(verify_message_body_md5(&body, &digest).is_ok());
        prop_assert!(verify_message_body_md5(&body, &digest.to_ascii_lowercase()).is_ok());
    }

    #[test]
    fn decode_inverts_encode(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(decode(&encode(&body)).unwrap(), body);
    }

    #[test]
    fn encoded_text_is_base64_alphabet(body in proptest::collection::vec(any::<u8>(), 1..256)) {
        let encoded = encode(&body);
        prop_assert_eq!(encoded.len() % 4, 0);
        prop_assert!(encoded
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/' || *b == b'='));
    }
}
