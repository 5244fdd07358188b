use proptest::prelude::*;

use kotoba_core::codec::{BilouCodec, BioCodec, SequenceCodec};
use kotoba_core::model::{ClassificationModel, EvalParameters, GisModel, PredicateParams};
use kotoba_core::{BeamSearch, ExtraContext, Span, WindowContextGenerator};

// Property-based tests for the codecs, the evaluator and the decoder

const TYPES: &[&str] = &["PER", "LOC", "ORG"];

fn spans_and_length() -> impl Strategy<Value = (Vec<Span>, usize)> {
    (
        prop::collection::vec((0usize..3, 1usize..4, 0usize..TYPES.len()), 0..6),
        0usize..3,
    )
        .prop_map(|(pieces, trailing)| {
            let mut spans = Vec::new();
            let mut position = 0;
            for (gap, len, kind) in pieces {
                let start = position + gap;
                spans.push(Span::typed(start, start + len, TYPES[kind]));
                position = start + len;
            }
            (spans, position + trailing)
        })
}

/// A random sparse weight table over `num_outcomes` outcomes.
fn weight_table() -> impl Strategy<Value = (usize, Vec<Vec<(bool, f64)>>)> {
    (1usize..5).prop_flat_map(|num_outcomes| {
        let entry = prop::collection::vec((any::<bool>(), -5.0f64..5.0), num_outcomes);
        (
            Just(num_outcomes),
            prop::collection::vec(entry, 1..8),
        )
    })
}

fn build_model(num_outcomes: usize, table: &[Vec<(bool, f64)>]) -> GisModel {
    let params = table
        .iter()
        .map(|entry| {
            let (outcomes, weights) = entry
                .iter()
                .enumerate()
                .filter(|(_, (active, _))| *active)
                .map(|(oid, (_, weight))| (oid, *weight))
                .unzip();
            PredicateParams::new(outcomes, weights).unwrap()
        })
        .collect();
    let predicates = (0..table.len()).map(|i| format!("p{i}")).collect();
    let outcomes = (0..num_outcomes).map(|i| format!("T{i}")).collect();
    GisModel::new(EvalParameters::new(params, num_outcomes), predicates, outcomes).unwrap()
}

/// Maps each token to the predicate named after it.
struct TokenPredicates;

impl kotoba_core::ContextGenerator for TokenPredicates {
    fn context(
        &self,
        index: usize,
        tokens: &[String],
        history: &[String],
        _extra: ExtraContext<'_>,
    ) -> Vec<String> {
        let mut context = vec![tokens[index].clone()];
        if let Some(prev) = history.last() {
            context.push(format!("p{}", prev.len() % 3));
        }
        context
    }
}

proptest! {
    #[test]
    fn bio_decode_inverts_encode((spans, length) in spans_and_length()) {
        let outcomes = BioCodec.encode(&spans, length).unwrap();
        prop_assert_eq!(outcomes.len(), length);
        prop_assert_eq!(BioCodec.decode(&outcomes).unwrap(), spans);
    }

    #[test]
    fn bilou_decode_inverts_encode((spans, length) in spans_and_length()) {
        let outcomes = BilouCodec.encode(&spans, length).unwrap();
        prop_assert_eq!(BilouCodec.decode(&outcomes).unwrap(), spans);
    }

    #[test]
    fn bio_compatibility_matches_definition(
        starts in prop::collection::vec(any::<bool>(), TYPES.len()),
        continues in prop::collection::vec(any::<bool>(), TYPES.len()),
        with_other in any::<bool>(),
    ) {
        let mut outcomes = Vec::new();
        if with_other {
            outcomes.push("other".to_string());
        }
        for (i, kind) in TYPES.iter().enumerate() {
            if starts[i] {
                outcomes.push(format!("{kind}-start"));
            }
            if continues[i] {
                outcomes.push(format!("{kind}-continue"));
            }
        }

        let expected = starts.iter().any(|&s| s)
            && continues.iter().zip(&starts).all(|(&c, &s)| !c || s);
        prop_assert_eq!(BioCodec.are_outcomes_compatible(&outcomes), expected);
    }

    #[test]
    fn eval_is_a_distribution(
        (num_outcomes, table) in weight_table(),
        picks in prop::collection::vec(0usize..10, 0..6),
    ) {
        let model = build_model(num_outcomes, &table);
        // ids past the table exercise unknown predicates
        let context: Vec<String> = picks.iter().map(|i| format!("p{i}")).collect();
        let probs = model.eval(&context);

        prop_assert_eq!(probs.len(), num_outcomes);
        prop_assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        prop_assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn beam_search_is_deterministic(
        (num_outcomes, table) in weight_table(),
        picks in prop::collection::vec(0usize..8, 1..7),
        beam_size in 1usize..5,
    ) {
        let model = build_model(num_outcomes, &table);
        let tokens: Vec<String> = picks.iter().map(|i| format!("p{i}")).collect();
        let search = BeamSearch::new(&model, &TokenPredicates, beam_size).unwrap();
        let validator = kotoba_core::AcceptAll;

        let first = search
            .best_sequences(beam_size, &tokens, ExtraContext::default(), &validator)
            .unwrap();
        let second = search
            .best_sequences(beam_size, &tokens, ExtraContext::default(), &validator)
            .unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= beam_size);
        for sequence in &first {
            prop_assert_eq!(sequence.len(), tokens.len());
        }
    }
}

#[test]
fn window_generator_drives_beam_search_end_to_end() {
    let model = build_model(2, &[vec![(true, 1.0), (false, 0.0)]]);
    let generator = WindowContextGenerator::new();
    let search = BeamSearch::new(&model, &generator, 2).unwrap();
    let tokens: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

    let best = search
        .best_sequence(&tokens, ExtraContext::default(), &kotoba_core::AcceptAll)
        .unwrap();
    assert_eq!(best.len(), 2);
    assert_eq!(model.num_outcomes(), 2);
}
