use crate::knox::bn::BigNumber;
use crate::CredxResult;
use indexmap::IndexSet;
use serde::{
    de::{DeserializeOwned, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserializer, Serializer,
};
use sha2::{Digest, Sha256};
use std::{
    fmt::{self, Formatter},
    hash::Hash,
    marker::PhantomData,
};

/// Normalize an attribute name: spaces removed, lower case
pub fn attr_common_view(attr: &str) -> String {
    attr.replace(' ', "").to_lowercase()
}

/// Encode a raw attribute value as a decimal integer string.
///
/// 32-bit integers encode to themselves so predicates can be proven on
/// them. Everything else is the SHA-256 of the value read as a big endian
/// integer.
pub fn encode_credential_attribute(raw_value: &str) -> String {
    if let Ok(val) = raw_value.parse::<i32>() {
        val.to_string()
    } else {
        BigNumber::from_bytes(&Sha256::digest(raw_value.as_bytes())).to_dec()
    }
}

/// Encode a list of raw values with [`encode_credential_attribute`].
/// An empty list is rejected.
pub fn encode_credential_attributes<S: AsRef<str>>(raw_values: &[S]) -> CredxResult<Vec<String>> {
    if raw_values.is_empty() {
        return Err(err_msg!("No raw attribute values to encode"));
    }
    Ok(raw_values
        .iter()
        .map(|raw| encode_credential_attribute(raw.as_ref()))
        .collect())
}

pub(crate) fn serialize_indexset<T: serde::Serialize, S: Serializer>(
    set: &IndexSet<T>,
    s: S,
) -> Result<S::Ok, S::Error> {
    let mut i = s.serialize_seq(Some(set.len()))?;
    for e in set {
        i.serialize_element(e)?;
    }
    i.end()
}

pub(crate) fn deserialize_indexset<'de, T: Eq + Hash + DeserializeOwned, D: Deserializer<'de>>(
    d: D,
) -> Result<IndexSet<T>, D::Error> {
    struct IndexSetVisitor<TT: Eq + DeserializeOwned> {
        _marker: PhantomData<TT>,
    }

    impl<'de, TT: Eq + Hash + DeserializeOwned> Visitor<'de> for IndexSetVisitor<TT> {
        type Value = IndexSet<TT>;

        fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
            write!(formatter, "a sequence")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut set = IndexSet::new();
            while let Some(e) = seq.next_element()? {
                set.insert(e);
            }
            Ok(set)
        }
    }

    d.deserialize_seq(IndexSetVisitor::<T> {
        _marker: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_attribute() {
        assert_eq!(
            encode_credential_attribute("101 Wilson Lane"),
            "68086943237164982734333428280784300550565381723532936263016368251445461241953"
        );
        assert_eq!(encode_credential_attribute("87121"), "87121");
        assert_eq!(
            encode_credential_attribute("SLC"),
            "101327353979588246869873249766058188995681113722618593621043638294296500696424"
        );
        assert_eq!(
            encode_credential_attribute(""),
            "102987336249554097029535212322581322789799900648198034993379397001115665086549"
        );
        assert_eq!(encode_credential_attribute("0"), "0");
        assert_eq!(encode_credential_attribute("2147483647"), "2147483647");
        assert_eq!(
            encode_credential_attribute("2147483648"),
            "26221484005389514539852548961319751347124425277437769688639924217837557266135"
        );
        assert_eq!(encode_credential_attribute("-2147483648"), "-2147483648");
        assert_eq!(
            encode_credential_attribute("-2147483649"),
            "68956915425095939579909400566452872085353864667122112803508671228696852865689"
        );
        assert_eq!(
            encode_credential_attribute("0.0"),
            "62838607218564353630028473473939957328943626306458686867332534889076311281879"
        );
    }

    #[test]
    fn encode_attribute_list() {
        let encoded = encode_credential_attributes(&["Alex", "28"]).unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0], encode_credential_attribute("Alex"));
        assert_eq!(encoded[1], "28");

        let err = encode_credential_attributes::<&str>(&[]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Input);
    }

    #[test]
    fn common_view() {
        assert_eq!(attr_common_view("First Name"), "firstname");
        assert_eq!(attr_common_view("AGE"), "age");
    }
}
