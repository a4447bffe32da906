use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use vkapi::{encode_query, ParamValue, Params};

const SPECIAL: &[char] = &[' ', '&', '=', '+', '%', '?', '#', '/', ',', 'ё', 'ж', '€', '🙂'];

/// Random string mixing alphanumerics with characters that need escaping
fn random_string(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..12);
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.3) {
                SPECIAL[rng.gen_range(0..SPECIAL.len())]
            } else {
                rng.sample(Alphanumeric) as char
            }
        })
        .collect()
}

fn random_value(rng: &mut StdRng) -> ParamValue {
    match rng.gen_range(0..3) {
        0 => ParamValue::Int(rng.gen()),
        1 => ParamValue::Bool(rng.gen()),
        _ => ParamValue::String(random_string(rng)),
    }
}

fn decode(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

#[test]
fn test_encode_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let mut params = Params::new();
        for _ in 0..rng.gen_range(0..8) {
            params.insert(random_string(&mut rng), random_value(&mut rng));
        }

        let encoded = encode_query(&params);
        let expected: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();

        assert_eq!(decode(&encoded), expected, "round trip failed for {:?}", encoded);
        assert_eq!(encoded, encode_query(&params));
    }
}

#[test]
fn test_encoded_query_has_no_raw_separators() {
    let mut params = Params::new();
    params.insert("text".to_string(), "a&b=c d".into());

    let encoded = encode_query(&params);
    assert_eq!(encoded.matches('&').count(), 0);
    assert_eq!(encoded.matches('=').count(), 1);
    assert!(!encoded.contains(' '));
}
