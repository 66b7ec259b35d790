//! The argument codec.
//!
//! The `args` column is an opaque, textual blob as far as the reservation
//! and execution engine is concerned; this module just fixes *this* crate's
//! choice of textual format (a JSON array) so scheduling and execution agree
//! on it.

use crate::error::Result;
use serde_json::Value;

/// Serialize a job's positional arguments to the text stored in `args`.
pub fn encode_args(args: &[Value]) -> String {
    // `Vec<Value>` always serializes; `serde_json::to_string` only fails on
    // writer errors or non-string map keys, neither possible here.
    serde_json::to_string(args).expect("argument vector is always JSON-serializable")
}

/// Deserialize the text stored in `args` back into a positional argument
/// vector. The inverse of [`encode_args`].
pub fn decode_args(raw: &str) -> Result<Vec<Value>> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_arbitrary_argument_vectors() {
        let args = vec![json!(1), json!("two"), json!({"three": [3, 3.0]})];
        let encoded = encode_args(&args);
        assert_eq!(decode_args(&encoded).unwrap(), args);
    }

    #[test]
    fn round_trips_the_empty_argument_vector() {
        assert_eq!(decode_args(&encode_args(&[])).unwrap(), Vec::<Value>::new());
    }
}
