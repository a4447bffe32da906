use crate::params::Params;
use url::form_urlencoded;

/// Encode a parameter set as an `application/x-www-form-urlencoded` query
/// string. Pairs come out in key order; an empty set gives an empty string.
pub fn encode_query(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k, v.to_string())))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_query(&Params::new()), "");
    }

    #[test]
    fn test_encode_escapes_values() {
        let mut params = Params::new();
        params.insert("q".to_string(), "hello world&more=yes".into());
        params.insert("name".to_string(), "Пётр".into());
        params.insert("count".to_string(), ParamValue::Int(10));
        params.insert("extended".to_string(), true.into());

        assert_eq!(
            encode_query(&params),
            "count=10&extended=true&name=%D0%9F%D1%91%D1%82%D1%80&q=hello+world%26more%3Dyes"
        );
    }

    #[test]
    fn test_encode_is_stable() {
        let mut params = Params::new();
        params.insert("z".to_string(), "1".into());
        params.insert("a".to_string(), "2".into());
        params.insert("m".to_string(), "3".into());

        let first = encode_query(&params);
        assert_eq!(first, "a=2&m=3&z=1");
        assert_eq!(first, encode_query(&params.clone()));
    }
}
