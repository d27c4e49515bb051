use std::sync::Arc;

use dataio_reader::{
    counted_array, decode, decode_bytes, enumeration, fixed_array, flags, structure, BitGroup, Context,
    DataioError, Descriptor, FormatVersion, Primitive, StreamCursor, StructBuilder, Value,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int(value: Option<&Value>) -> i64 {
    value.and_then(Value::as_int).expect("integer value")
}

// --- Flags ---

#[test]
fn flags_extract_named_groups() {
    init();
    let desc = flags(
        "ShapeFlags",
        Primitive::UInt16,
        vec![
            BitGroup::bit("visible", 0),
            BitGroup::new("kind", 1, 3),
            BitGroup::bit("locked", 15),
        ],
    )
    .unwrap();

    let value = decode_bytes(&desc.into(), &[0x0B, 0x80], &Context::new()).unwrap();
    let flags = value.as_flags().expect("flags value");
    assert_eq!(flags.raw(), 0x800B);
    assert_eq!(value.as_int(), Some(0x800B));
    assert_eq!(int(flags.get("visible")), 1);
    assert_eq!(int(flags.get("kind")), 5);
    assert_eq!(int(flags.get("locked")), 1);

    let groups = flags.dictvalue();
    let names: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(names, ["visible", "kind", "locked"]);
    assert_eq!(flags.dictvalue(), flags.dictvalue());
}

#[test]
fn single_bit_groups_ignore_other_bits() {
    init();
    let groups = (0..16).map(|b| BitGroup::bit(format!("b{}", b), b)).collect();
    let desc: Descriptor = flags("AllBits", Primitive::UInt16, groups).unwrap().into();

    for bit in 0..16u32 {
        let only = 1u16 << bit;
        for raw in [0u16, 0xFFFF, only, !only] {
            let value = decode_bytes(&desc, &raw.to_le_bytes(), &Context::new()).unwrap();
            let expected = ((raw >> bit) & 1) as i64;
            assert_eq!(int(value.get(&format!("b{}", bit))), expected, "bit {} of {:#06x}", bit, raw);
        }
    }
}

#[test]
fn flag_group_can_be_an_enumeration() {
    init();
    let align = enumeration("Align", Primitive::UInt8, &["LEFT", "RIGHT", "CENTER"], &[]).unwrap();
    let desc = flags(
        "ParaFlags",
        Primitive::UInt8,
        vec![BitGroup::new("align", 4, 5).with_enum(Arc::clone(&align))],
    )
    .unwrap();

    let value = decode_bytes(&desc.into(), &[0x20], &Context::new()).unwrap();
    let group = value.get("align").and_then(Value::as_enum).expect("enum group");
    assert_eq!(group.name(), "CENTER");
    assert!(Arc::ptr_eq(group, &align.canonical(2).unwrap()));
}

#[test]
fn signed_flags_base_is_read_at_its_width() {
    init();
    let desc = flags("Signed", Primitive::Int8, vec![BitGroup::new("all", 0, 7)]).unwrap();
    let value = decode_bytes(&desc.into(), &[0xFF], &Context::new()).unwrap();
    assert_eq!(int(value.get("all")), 0xFF);
}

#[test]
fn invalid_flag_definitions_are_rejected() {
    let cases = [
        flags("TooWide", Primitive::UInt16, vec![BitGroup::new("x", 8, 16)]),
        flags("Reversed", Primitive::UInt32, vec![BitGroup::new("x", 5, 2)]),
        flags("Twice", Primitive::UInt32, vec![BitGroup::bit("x", 0), BitGroup::bit("x", 1)]),
        flags("Float", Primitive::Double, vec![BitGroup::bit("x", 0)]),
    ];
    for case in cases {
        assert!(matches!(case, Err(DataioError::InvalidSchema(_))));
    }
}

#[test]
fn bit_group_masks_never_overflow() {
    assert_eq!(BitGroup::new("all", 0, 63).mask(), u64::MAX);
    assert_eq!(BitGroup::new("all", 0, 63).extract(u64::MAX), u64::MAX);
    assert_eq!(BitGroup::new("reversed", 5, 2).mask(), 0);
    assert_eq!(BitGroup::new("reversed", 5, 2).extract(0xFF), 0);
    assert_eq!(BitGroup::new("past_end", 64, 70).extract(u64::MAX), 0);

    let kind = flags("Nibbles", Primitive::UInt8, vec![BitGroup::new("high", 4, 7)]).unwrap();
    assert_eq!(kind.name(), "Nibbles");
    assert_eq!(kind.base(), Primitive::UInt8);
    assert_eq!(kind.groups()[0].bits(), (4, 7));
    assert_eq!(kind.groups()[0].mask(), 0xF);
}

// --- Enumerations ---

#[test]
fn enumerations_canonicalize_instances() {
    init();
    let kind = enumeration("Kind", Primitive::UInt8, &["ZERO", "ONE"], &[("TEN", 10)]).unwrap();
    let desc: Descriptor = Arc::clone(&kind).into();

    let first = decode_bytes(&desc, &[0x01], &Context::new()).unwrap();
    let second = decode_bytes(&desc, &[0x01], &Context::new()).unwrap();
    assert_eq!(first, second);
    let (a, b) = (first.as_enum().unwrap(), second.as_enum().unwrap());
    assert!(Arc::ptr_eq(a, b));
    assert_eq!(a.name(), "ONE");
    assert_eq!(a.value(), 1);
    assert_eq!(a.enum_name(), "Kind");

    let ten = decode_bytes(&desc, &[10], &Context::new()).unwrap();
    assert_eq!(ten.as_enum().unwrap().name(), "TEN");
    assert_eq!(kind.value_of("TEN"), Some(10));
}

#[test]
fn unknown_enum_values_decode_and_name_as_numbers() {
    init();
    let kind = enumeration("Kind", Primitive::UInt16, &["ZERO"], &[]).unwrap();
    let value = decode_bytes(&Arc::clone(&kind).into(), &[0x39, 0x05], &Context::new()).unwrap();
    let unknown = value.as_enum().unwrap();
    assert!(!unknown.is_known());
    assert_eq!(unknown.name(), "1337");
    assert_eq!(unknown.to_string(), "1337");
    assert_eq!(kind.name_for(1337), "1337");
    assert_eq!(kind.name_for(0), "ZERO");
}

#[test]
fn same_value_of_different_enumerations_differs() {
    let a = enumeration("A", Primitive::UInt8, &["X"], &[]).unwrap();
    let b = enumeration("B", Primitive::UInt8, &["X"], &[]).unwrap();
    assert_ne!(*a.canonical(0).unwrap(), *b.canonical(0).unwrap());
}

#[test]
fn duplicate_enum_names_are_rejected() {
    let err = enumeration("Dup", Primitive::UInt8, &["A"], &[("A", 5)]).unwrap_err();
    assert!(matches!(err, DataioError::InvalidSchema(_)));
    let err = enumeration("Text", Primitive::Bstr, &["A"], &[]).unwrap_err();
    assert!(matches!(err, DataioError::InvalidSchema(_)));
}

// --- Arrays ---

#[test]
fn counted_array_reads_prefix_then_elements() {
    init();
    let desc = counted_array(Primitive::UInt16, Primitive::UInt8).unwrap();

    let mut cursor = StreamCursor::new(&[0x03, 0x00, 0x0A, 0x0B, 0x0C, 0xFF][..]);
    let value = decode(&desc, &mut cursor, &Context::new()).unwrap();
    assert_eq!(value, Value::Array(vec![Value::Int(10), Value::Int(11), Value::Int(12)]));
    assert_eq!(cursor.position(), 5);

    let mut cursor = StreamCursor::new(&[0x00, 0x00, 0x0A][..]);
    let value = decode(&desc, &mut cursor, &Context::new()).unwrap();
    assert_eq!(value.as_array().map(<[Value]>::len), Some(0));
    assert_eq!(cursor.position(), 2);
}

#[test]
fn arrays_nest() {
    init();
    let inner = counted_array(Primitive::UInt8, Primitive::UInt8).unwrap();
    let outer = fixed_array(inner, 2).unwrap();
    let value = decode_bytes(&outer, &[1, 5, 2, 6, 7], &Context::new()).unwrap();
    assert_eq!(value.to_string(), "[[5], [6, 7]]");
}

#[test]
fn truncated_array_fails() {
    init();
    let desc = counted_array(Primitive::UInt8, Primitive::UInt8).unwrap();
    let err = decode_bytes(&desc, &[2, 1], &Context::new()).unwrap_err();
    assert!(matches!(err, DataioError::EndOfStream { position: 2, .. }));
}

#[test]
fn fixed_arrays_are_interned() {
    let a = fixed_array(Primitive::UInt32, 4).unwrap();
    let b = fixed_array(Primitive::UInt32, 4).unwrap();
    assert_eq!(a, b);
    match (&a, &b) {
        (Descriptor::Array(x), Descriptor::Array(y)) => assert!(Arc::ptr_eq(x, y)),
        _ => panic!("expected array descriptors"),
    }
    assert_ne!(a, fixed_array(Primitive::UInt32, 3).unwrap());
    assert_ne!(a, fixed_array(Primitive::Int32, 4).unwrap());

    let point = structure("Point", [("x", Primitive::Int16)]).unwrap();
    let p1 = fixed_array(Arc::clone(&point), 2).unwrap();
    let p2 = fixed_array(Arc::clone(&point), 2).unwrap();
    assert_eq!(p1, p2);
    let other = structure("Point", [("x", Primitive::Int16)]).unwrap();
    assert_ne!(p1, fixed_array(other, 2).unwrap());
}

#[test]
fn descriptors_are_shared_across_threads() {
    let kind = enumeration("Shared", Primitive::UInt8, &["A", "B"], &[]).unwrap();
    let results: Vec<(Descriptor, Arc<dataio_reader::EnumValue>)> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let kind = Arc::clone(&kind);
                s.spawn(move || {
                    let array = fixed_array(Primitive::UInt16, 7).unwrap();
                    let value = decode_bytes(&kind.into(), &[1], &Context::new()).unwrap();
                    (array, Arc::clone(value.as_enum().unwrap()))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for (array, value) in &results[1..] {
        assert_eq!(*array, results[0].0);
        assert!(Arc::ptr_eq(value, &results[0].1));
    }
}

#[test]
fn counted_array_needs_unsigned_count() {
    assert!(matches!(
        counted_array(Primitive::Int16, Primitive::UInt8),
        Err(DataioError::InvalidSchema(_))
    ));
    assert!(counted_array(Primitive::Double, Primitive::UInt8).is_err());
}

// --- Structs ---

fn tagged_value() -> Descriptor {
    StructBuilder::new("TaggedValue")
        .field("kind", Primitive::UInt8)
        .resolved_field("value", |attrs, _ctx| {
            Ok(match attrs.get("kind").and_then(Value::as_int) {
                Some(1) => Some(Primitive::UInt16.into()),
                _ => Some(Primitive::UInt8.into()),
            })
        })
        .build()
        .unwrap()
        .into()
}

#[test]
fn resolver_sees_just_decoded_field() {
    init();
    let desc = tagged_value();

    let mut cursor = StreamCursor::new(&[0x01, 0x34, 0x12][..]);
    let value = decode(&desc, &mut cursor, &Context::new()).unwrap();
    assert_eq!(int(value.get("value")), 0x1234);
    assert_eq!(cursor.position(), 3);

    let mut cursor = StreamCursor::new(&[0x00, 0x34, 0x12][..]);
    let value = decode(&desc, &mut cursor, &Context::new()).unwrap();
    assert_eq!(int(value.get("value")), 0x34);
    assert_eq!(cursor.position(), 2);
}

#[test]
fn struct_attributes_keep_declaration_order() {
    init();
    let desc = structure(
        "Mixed",
        [
            ("z", Descriptor::from(Primitive::UInt8)),
            ("a", counted_array(Primitive::UInt8, Primitive::WChar).unwrap()),
            ("m", Primitive::Bstr.into()),
        ],
    )
    .unwrap();
    let bytes = [7, 1, 0x41, 0x00, 0x01, 0x00, 0x42, 0x00];
    let value = decode_bytes(&desc.into(), &bytes, &Context::new()).unwrap();
    let s = value.as_struct().unwrap();
    assert_eq!(s.type_name(), "Mixed");
    let names: Vec<&str> = s.attributes().keys().map(String::as_str).collect();
    assert_eq!(names, ["z", "a", "m"]);
    assert_eq!(s.get("m").and_then(Value::as_str), Some("B"));
}

#[test]
fn truncated_field_reports_struct_and_field() {
    init();
    let desc = structure("Pair", [("a", Primitive::UInt16), ("b", Primitive::UInt32)]).unwrap();
    let err = decode_bytes(&desc.into(), &[1, 0, 2, 0], &Context::new()).unwrap_err();

    assert_eq!(err.to_string(), "can't parse field `b` of `Pair`");
    assert_eq!(err.field_path(), vec![("Pair", "b")]);
    assert!(err.is_end_of_stream());
    assert!(matches!(err.root_cause(), DataioError::EndOfStream { position: 4, requested: 2 }));

    let source = std::error::Error::source(&err).expect("source error");
    assert!(source.to_string().contains("offset 4"));
}

#[test]
fn nested_failure_reports_full_field_path() {
    init();
    let pair = structure("Pair", [("a", Primitive::UInt16), ("b", Primitive::UInt32)]).unwrap();
    let outer = StructBuilder::new("Outer")
        .field("header", Primitive::UInt8)
        .field("pairs", fixed_array(pair, 1).unwrap())
        .build()
        .unwrap();

    let err = decode_bytes(&outer.into(), &[9, 1, 0, 2, 0], &Context::new()).unwrap_err();
    assert_eq!(err.field_path(), vec![("Outer", "pairs"), ("Pair", "b")]);
    assert!(err.is_end_of_stream());
}

#[test]
fn resolver_errors_are_wrapped() {
    init();
    let desc = StructBuilder::new("Picky")
        .field("kind", Primitive::UInt8)
        .resolved_field("body", |attrs, _ctx| {
            Err(DataioError::Resolver(format!("unsupported kind {}", int(attrs.get("kind")))))
        })
        .build()
        .unwrap();

    let err = decode_bytes(&desc.into(), &[3, 0, 0], &Context::new()).unwrap_err();
    assert_eq!(err.field_path(), vec![("Picky", "body")]);
    assert!(!err.is_end_of_stream());
    assert!(matches!(err.root_cause(), DataioError::Resolver(msg) if msg == "unsupported kind 3"));
}

#[test]
fn derived_structs_prepend_ancestor_fields() {
    init();
    let base = structure("Base", [("tag", Primitive::UInt8)]).unwrap();
    let derived = StructBuilder::new("Derived")
        .extends(&base)
        .field("len", Primitive::UInt16)
        .build()
        .unwrap();
    let leaf = StructBuilder::new("Leaf")
        .extends(&derived)
        .field("data", fixed_array(Primitive::UInt8, 2).unwrap())
        .build()
        .unwrap();

    let names: Vec<&str> = leaf.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["tag", "len", "data"]);

    let value = decode_bytes(&Arc::clone(&leaf).into(), &[7, 2, 0, 8, 9], &Context::new()).unwrap();
    let s = value.as_struct().unwrap();
    assert_eq!(int(s.get("tag")), 7);
    assert_eq!(int(s.get("len")), 2);
    assert!(s.is_instance_of(&base));
    assert!(s.is_instance_of(&derived));

    let plain = decode_bytes(&Arc::clone(&base).into(), &[7], &Context::new()).unwrap();
    assert!(!plain.as_struct().unwrap().is_instance_of(&leaf));
}

#[test]
fn duplicate_field_across_ancestors_is_rejected() {
    let base = structure("Base", [("tag", Primitive::UInt8)]).unwrap();
    let err = StructBuilder::new("Clash")
        .extends(&base)
        .field("tag", Primitive::UInt16)
        .build()
        .unwrap_err();
    assert!(matches!(err, DataioError::InvalidSchema(_)));

    let err = structure("Twice", [("x", Primitive::UInt8), ("x", Primitive::UInt8)]).unwrap_err();
    assert!(matches!(err, DataioError::InvalidSchema(_)));
}

#[test]
fn version_gated_fields_follow_context() {
    init();
    let desc: Descriptor = StructBuilder::new("Versioned")
        .field("a", Primitive::UInt8)
        .optional_field("b", Primitive::UInt16, |_attrs, ctx| {
            ctx.version_at_least(FormatVersion::new(5, 0, 2, 0))
        })
        .build()
        .unwrap()
        .into();
    let bytes = [1, 2, 0];

    let newer = Context::new().with_version("5.0.3.0".parse().unwrap());
    let mut cursor = StreamCursor::new(&bytes[..]);
    let value = decode(&desc, &mut cursor, &newer).unwrap();
    assert_eq!(int(value.get("b")), 2);
    assert_eq!(cursor.position(), 3);

    for ctx in [Context::new().with_version(FormatVersion::new(5, 0, 1, 0)), Context::new()] {
        let mut cursor = StreamCursor::new(&bytes[..]);
        let value = decode(&desc, &mut cursor, &ctx).unwrap();
        assert!(value.get("b").is_none());
        assert_eq!(cursor.position(), 1);
    }
}

#[test]
fn flattened_struct_merges_flag_groups() {
    init();
    let bits = flags("Bits", Primitive::UInt8, vec![BitGroup::bit("bold", 0), BitGroup::bit("italic", 1)]).unwrap();
    let desc = structure("Style", [("size", Descriptor::from(Primitive::UInt8)), ("attr", bits.into())]).unwrap();
    let value = decode_bytes(&desc.into(), &[12, 0b10], &Context::new()).unwrap();

    let flat = value.as_struct().unwrap().flattened();
    let names: Vec<&str> = flat.keys().map(String::as_str).collect();
    assert_eq!(names, ["size", "bold", "italic"]);
    assert_eq!(int(flat.get("italic")), 1);
    assert_eq!(int(flat.get("bold")), 0);
}
