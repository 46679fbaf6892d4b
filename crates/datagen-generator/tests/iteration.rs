//! End-to-end iteration semantics: per-field state, initial values,
//! wrap-around, string rendering, and generation-offset fast-forward.

use datagen_core::Value;
use datagen_generator::Generator;

const ITERATION_SCHEMA: &str = r#"
{
  "type": "record",
  "name": "IterationHolder",
  "fields": [
    {
      "name": "long_iteration",
      "type": {
        "type": "long",
        "arg.properties": {
          "iteration": {"start": -50, "restart": 0, "step": 47, "initial": -50}
        }
      }
    },
    {
      "name": "nested",
      "type": {
        "type": "record",
        "name": "Nested",
        "fields": [
          {
            "name": "long_iteration",
            "type": {
              "type": "long",
              "arg.properties": {
                "iteration": {"start": -50, "restart": 0, "step": 47, "initial": -50}
              }
            }
          }
        ]
      }
    },
    {
      "name": "string_iteration",
      "type": {
        "type": "string",
        "arg.properties": {"iteration": {"start": 1, "restart": 3, "step": 1}}
      }
    },
    {
      "name": "prefixed_suffixed_string_iteration",
      "type": {
        "type": "string",
        "arg.properties": {
          "iteration": {"start": 0, "restart": 5, "step": 1},
          "prefix": "pre-",
          "suffix": "-post"
        }
      }
    },
    {
      "name": "int_iteration_offset",
      "type": {
        "type": "int",
        "arg.properties": {
          "iteration": {"start": 0, "restart": 50, "step": 10, "initial": 40}
        }
      }
    },
    {
      "name": "double_iteration_offset",
      "type": {
        "type": "double",
        "arg.properties": {
          "iteration": {"start": 0.0, "restart": 10.0, "step": 2.5, "initial": 5.0}
        }
      }
    },
    {
      "name": "boolean_iteration",
      "type": {
        "type": "boolean",
        "arg.properties": {"iteration": {"start": true}}
      }
    }
  ]
}"#;

fn iteration_generator(generation: u64) -> Generator {
    Generator::builder()
        .schema_str(ITERATION_SCHEMA)
        .unwrap()
        .seed(0)
        .generation(generation)
        .build()
        .unwrap()
}

#[test]
fn creates_an_iterator_per_field_even_for_equal_schemas() {
    let mut generator = iteration_generator(0);
    let first = generator.generate().unwrap();
    let second = generator.generate().unwrap();

    assert_eq!(first.field("long_iteration"), Some(&Value::Long(-50)));
    assert_eq!(
        first.field("nested").unwrap().field("long_iteration"),
        Some(&Value::Long(-50))
    );

    assert_eq!(second.field("long_iteration"), Some(&Value::Long(-3)));
    assert_eq!(
        second.field("nested").unwrap().field("long_iteration"),
        Some(&Value::Long(-3))
    );
}

#[test]
fn begins_iteration_at_the_initial_value() {
    let mut generator = iteration_generator(0);
    let generated = generator.generate().unwrap();
    assert_eq!(generated.field("int_iteration_offset"), Some(&Value::Int(40)));
    assert_eq!(
        generated.field("double_iteration_offset"),
        Some(&Value::Double(5.0))
    );
}

#[test]
fn supports_string_iteration() {
    let mut generator = iteration_generator(0);
    let values: Vec<_> = (0..3)
        .map(|_| {
            generator
                .generate()
                .unwrap()
                .field("string_iteration")
                .unwrap()
                .clone()
        })
        .collect();
    assert_eq!(
        values,
        vec![
            Value::String("1".to_string()),
            Value::String("2".to_string()),
            Value::String("1".to_string()),
        ]
    );
}

#[test]
fn supports_prefix_and_suffix() {
    let mut generator = iteration_generator(0);
    let generated = generator.generate().unwrap();
    assert_eq!(
        generated.field("prefixed_suffixed_string_iteration"),
        Some(&Value::String("pre-0-post".to_string()))
    );
}

#[test]
fn boolean_iteration_start_depends_on_offset_parity() {
    for generation in 0..8u64 {
        let mut generator = iteration_generator(generation);
        let generated = generator.generate().unwrap();
        let expected = generation % 2 == 0;
        assert_eq!(
            generated.field("boolean_iteration"),
            Some(&Value::Boolean(expected)),
            "wrong start state at generation {generation}"
        );
    }
}

#[test]
fn generation_offset_simulates_previous_iterations() {
    let mut reference = iteration_generator(0);
    for generation in 0..1000u64 {
        let mut simulation = iteration_generator(generation);
        assert_eq!(
            simulation.generate().unwrap(),
            reference.generate().unwrap(),
            "mismatch at generation {generation}"
        );
    }
}
