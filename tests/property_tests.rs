//! Property-based tests for the round-trip and idempotence guarantees.
//!
//! Floats are drawn from normal values only, so equality is never spoiled by NaN.

use nbt_stream::{
    calculate_optional_info, from_slice, read_tokens, read_tokens_with_options, to_vec,
    write_tokens, ByteArrayTag, CompoundBuilder, CompoundTag, IntArrayTag, ListTag, LongArrayTag,
    ReadOptions, RootEntry, Tag, TagId, Token,
};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Tag> {
    prop_oneof![
        any::<i8>().prop_map(Tag::Byte),
        any::<i16>().prop_map(Tag::Short),
        any::<i32>().prop_map(Tag::Int),
        any::<i64>().prop_map(Tag::Long),
        prop::num::f32::NORMAL.prop_map(Tag::Float),
        prop::num::f64::NORMAL.prop_map(Tag::Double),
        ".{0,12}".prop_map(Tag::String),
        prop::collection::vec(any::<i8>(), 0..40).prop_map(|v| Tag::ByteArray(ByteArrayTag::from(v))),
        prop::collection::vec(any::<i32>(), 0..20).prop_map(|v| Tag::IntArray(IntArrayTag::from(v))),
        prop::collection::vec(any::<i64>(), 0..10).prop_map(|v| Tag::LongArray(LongArrayTag::from(v))),
    ]
}

fn compound_of(entries: Vec<(String, Tag)>) -> CompoundTag {
    let mut builder = CompoundBuilder::loose();
    builder.put_all(entries).unwrap();
    builder.build()
}

fn tag() -> impl Strategy<Value = Tag> {
    leaf().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(("[a-z]{0,6}", inner.clone()), 0..6)
                .prop_map(|entries| Tag::Compound(compound_of(entries))),
            prop::collection::vec(inner, 0..6).prop_map(|elements| {
                // Keep only the elements sharing the first one's kind.
                let id = elements.first().map_or(TagId::End, Tag::id);
                let elements: Vec<Tag> = elements.into_iter().filter(|t| t.id() == id).collect();
                Tag::List(ListTag::new(id, elements).unwrap())
            }),
        ]
    })
}

fn root() -> impl Strategy<Value = RootEntry> {
    (
        ".{0,8}",
        prop::collection::vec(("[a-zA-Z0-9 ]{0,8}", tag()), 0..8),
    )
        .prop_map(|(name, entries)| RootEntry::new(name, compound_of(entries)))
}

fn strip(token: Token) -> Token {
    match token {
        Token::ByteArrayStart { .. } => Token::ByteArrayStart { size: None },
        Token::IntArrayStart { .. } => Token::IntArrayStart { size: None },
        Token::LongArrayStart { .. } => Token::LongArrayStart { size: None },
        Token::ListStart { .. } => Token::ListStart {
            size: None,
            element_id: None,
        },
        other => other,
    }
}

fn calculate(tokens: Vec<Token>) -> Vec<Token> {
    calculate_optional_info(tokens.into_iter().map(Ok))
        .collect::<Result<_, _>>()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_tree_round_trip(root in root()) {
        let bytes = to_vec(&root).unwrap();
        prop_assert_eq!(from_slice(&bytes).unwrap(), root);
    }

    #[test]
    fn prop_bytes_round_trip(root in root()) {
        let bytes = to_vec(&root).unwrap();
        let mut out = Vec::new();
        write_tokens(&mut out, read_tokens(bytes.as_slice())).unwrap();
        prop_assert_eq!(out, bytes);
    }

    #[test]
    fn prop_chunk_size_does_not_change_tree(root in root(), chunk_size in 1usize..64) {
        let bytes = to_vec(&root).unwrap();
        let options = ReadOptions::new().with_chunk_size(chunk_size);
        let back = RootEntry::read_from(read_tokens_with_options(bytes.as_slice(), options)).unwrap();
        prop_assert_eq!(back, root);
    }

    #[test]
    fn prop_complete_stream_is_unchanged(root in root()) {
        let tokens: Vec<Token> = root.tokens().collect();
        prop_assert_eq!(calculate(tokens.clone()), tokens);
    }

    #[test]
    fn prop_calculator_is_idempotent(root in root()) {
        let stripped: Vec<Token> = root.tokens().map(strip).collect();
        let once = calculate(stripped);
        let twice = calculate(once.clone());
        prop_assert!(once.iter().all(|t| !t.is_missing_info()));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_stripped_stream_writes_readable_bytes(root in root()) {
        let mut out = Vec::new();
        write_tokens(&mut out, root.tokens().map(strip).map(Ok)).unwrap();
        let back = from_slice(&out).unwrap();
        // Only the declared kind of empty lists can differ.
        prop_assert_eq!(back.value.len(), root.value.len());
        prop_assert_eq!(back.name, root.name);
    }
}
