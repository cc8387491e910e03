//! LightGBM conversion tests: dump loading, schema inference and document
//! scoring parity with LightGBM's own predictions.

use approx::assert_abs_diff_eq;
use rstest::rstest;

use lgbm_pmml::compat::lightgbm::{
    LgbTree, ObjectiveFunction, ObjectiveKind, ParseError, RAW_SCORE_FIELD,
};
use lgbm_pmml::pmml::{
    DataType, InvalidValueTreatment, MiningFunction, MiningModel, MissingValueStrategy, Model,
    MultipleModelMethod, NormalizationMethod, OpType, Predicate, RegressionModel, SimpleOperator,
    SimplePredicate, TreeModel,
};
use lgbm_pmml::testing::{evaluate_sum, evaluate_tree, lightgbm_leaf_value, record, ModelText};
use lgbm_pmml::{ConversionError, ConvertOptions, Feature, Label, LgbModel, Schema};

use super::test_data::load_test_case;

const TOLERANCE: f64 = 1e-12;

// =============================================================================
// Helpers
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn options(compact: bool) -> ConvertOptions {
    ConvertOptions::builder().compact(compact).build().unwrap()
}

fn load(text: &ModelText) -> LgbModel {
    LgbModel::from_string(&text.render()).unwrap()
}

fn mining(model: &Model) -> &MiningModel {
    match model {
        Model::MiningModel(mining) => mining,
        other => panic!("expected a mining model, got {other:?}"),
    }
}

fn regression(model: &Model) -> &RegressionModel {
    match model {
        Model::RegressionModel(regression) => regression,
        other => panic!("expected a regression model, got {other:?}"),
    }
}

fn tree(model: &Model) -> &TreeModel {
    match model {
        Model::TreeModel(tree) => tree,
        other => panic!("expected a tree model, got {other:?}"),
    }
}

fn simple(predicate: &Predicate) -> &SimplePredicate {
    match predicate {
        Predicate::Simple(simple) => simple,
        other => panic!("expected a simple predicate, got {other:?}"),
    }
}

// =============================================================================
// Fixture: mixed feature regression
// =============================================================================

#[test]
fn fixture_loads() {
    init_tracing();
    let case = load_test_case("mixed_regression");
    let model = &case.model;

    assert_eq!(model.header.version.as_deref(), Some("v4"));
    assert_eq!(model.num_trees(), 3);
    assert_eq!(model.num_features(), 4);
    assert_eq!(model.header.feature_names, vec!["num", "flag", "color", "unused"]);
    assert_eq!(model.objective().map(ObjectiveFunction::name), Some("regression"));
    assert_eq!(model.feature_importances.get("color"), Some(&3.0));
    assert_eq!(model.feature_importances.get("unused"), None);
    assert_eq!(
        model.parameters.as_ref().and_then(|p| p.get("boosting")),
        Some("gbdt")
    );
    assert_eq!(model.pandas_categorical.len(), 1);
    assert_eq!(model.trees[1].shrinkage, 0.1);
    assert_eq!(model.trees[2].cat_threshold, vec![5, 4]);
}

#[test]
fn fixture_schema() {
    let case = load_test_case("mixed_regression");
    let schema = case.model.encode_schema(None, None).unwrap();

    assert_eq!(
        schema.label(),
        &Label::Continuous {
            name: Some("_target".into()),
            data_type: DataType::Double,
        }
    );
    match schema.feature(0) {
        Some(Feature::Continuous { name, interval, .. }) => {
            assert_eq!(name, "num");
            let interval = interval.expect("bounded feature");
            assert_eq!(interval.left_margin, Some(-3.5));
            assert_eq!(interval.right_margin, Some(12.0));
        }
        other => panic!("unexpected feature {other:?}"),
    }
    assert!(matches!(schema.feature(1), Some(Feature::Binary { name, .. }) if name == "flag"));
    match schema.feature(2) {
        Some(Feature::Categorical { labels, data_type, .. }) => {
            assert_eq!(labels, &["blue", "green", "red", "yellow"]);
            assert_eq!(*data_type, DataType::String);
        }
        other => panic!("unexpected feature {other:?}"),
    }
    assert_eq!(schema.feature(3), None);
}

#[rstest]
fn fixture_scores_match_lightgbm(#[values(true, false)] compact: bool) {
    let case = load_test_case("mixed_regression");
    let pmml = case.model.encode_pmml(&options(compact)).unwrap();

    for (i, row) in case.expected.rows.iter().enumerate() {
        let reference: f64 = case
            .model
            .trees
            .iter()
            .map(|tree| lightgbm_leaf_value(tree, &row.lightgbm_row))
            .sum();
        assert_abs_diff_eq!(reference, row.score, epsilon = TOLERANCE);

        let score = evaluate_sum(&pmml.model, &row.record())
            .unwrap_or_else(|| panic!("{}: row {i} has no prediction", case.name));
        assert_abs_diff_eq!(score, row.score, epsilon = TOLERANCE);
    }
}

#[rstest]
#[case(&[("flag", "1"), ("color", "red")], 0.1 + 0.07 + 0.15)]
#[case(&[("num", "3"), ("flag", "0")], 0.3 - 0.05 + 0.02)]
#[case(&[], 0.1 - 0.05 + 0.02)]
fn fixture_missing_values_follow_default_child(#[case] values: &[(&str, &str)], #[case] expected: f64) {
    let case = load_test_case("mixed_regression");
    let input = record(values.iter().copied());

    for compact in [false, true] {
        let pmml = case.model.encode_pmml(&options(compact)).unwrap();
        let score = evaluate_sum(&pmml.model, &input).unwrap();
        assert_abs_diff_eq!(score, expected, epsilon = TOLERANCE);
    }
}

#[test]
fn fixture_document() {
    let case = load_test_case("mixed_regression");
    let pmml = case.model.encode_pmml(&ConvertOptions::default()).unwrap();

    let names: Vec<_> = pmml.data_dictionary.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["_target", "num", "flag", "color"]);

    let num = pmml.data_field("num").unwrap();
    assert_eq!(num.missing_values, vec!["NaN"]);
    assert_eq!(num.intervals.len(), 1);

    let flag = pmml.data_field("flag").unwrap();
    assert_eq!(flag.op_type, OpType::Categorical);
    assert_eq!(flag.data_type, DataType::Integer);
    assert_eq!(flag.values, vec!["0", "1"]);
    assert!(flag.missing_values.is_empty());

    let color = pmml.data_field("color").unwrap();
    assert_eq!(color.values, vec!["blue", "green", "red", "yellow"]);

    let top = mining(&pmml.model);
    assert_eq!(top.algorithm_name.as_deref(), Some("LightGBM"));
    assert_eq!(top.segmentation.multiple_model_method, MultipleModelMethod::Sum);
    assert_eq!(top.segmentation.segments.len(), 3);
    let color = top.mining_schema.field("color").unwrap();
    assert_eq!(color.importance, Some(3.0));
    assert_eq!(color.invalid_value_treatment, Some(InvalidValueTreatment::AsMissing));
    assert_eq!(
        top.mining_schema.field("num").unwrap().invalid_value_treatment,
        Some(InvalidValueTreatment::AsIs)
    );

    // Tree 1 only splits on `flag`
    let nested = top.segmentation.segments[1].model.mining_schema();
    let nested: Vec<_> = nested.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(nested, vec!["flag"]);

    let json = serde_json::to_value(&pmml).unwrap();
    assert_eq!(json["model"]["type"], "MiningModel");
    assert_eq!(json["version"], "4.4");
}

#[test]
fn fixture_nested_categorical_split() {
    let case = load_test_case("mixed_regression");
    let pmml = case.model.encode_pmml(&options(false)).unwrap();
    let root = &tree(&mining(&pmml.model).segmentation.segments[2].model).node;

    let left = &root.nodes[0];
    match &left.predicate {
        Predicate::SimpleSet(set) => assert_eq!(set.values, vec!["blue", "red"]),
        other => panic!("unexpected predicate {other:?}"),
    }
    assert_eq!(root.default_child.as_deref(), Some("-3"));

    // Only blue and red reach node 1; red goes left
    let inner = simple(&left.nodes[0].predicate);
    assert_eq!(inner.operator, SimpleOperator::Equal);
    assert_eq!(inner.value, "red");
    let inner = simple(&left.nodes[1].predicate);
    assert_eq!(inner.operator, SimpleOperator::Equal);
    assert_eq!(inner.value, "blue");
}

// =============================================================================
// Synthetic dumps
// =============================================================================

#[test]
fn single_split_regression() {
    let text = ModelText::new("regression")
        .feature("f0", "[0:5]")
        .tree(LgbTree::numeric_split(0, 0.5, 1.0, -1.0));
    let pmml = load(&text).encode_pmml(&options(false)).unwrap();
    let tree = tree(&mining(&pmml.model).segmentation.segments[0].model);

    assert_eq!(tree.missing_value_strategy, MissingValueStrategy::DefaultChild);
    let root = &tree.node;
    assert_eq!(root.id.as_deref(), Some("0"));
    assert_eq!(root.default_child.as_deref(), Some("-2"));

    let left = &root.nodes[0];
    assert_eq!(left.id.as_deref(), Some("-1"));
    assert_eq!(left.score, Some(1.0));
    assert_eq!(
        left.predicate,
        Predicate::simple("f0", SimpleOperator::LessOrEqual, "0.5")
    );
    let right = &root.nodes[1];
    assert_eq!(right.id.as_deref(), Some("-2"));
    assert_eq!(right.score, Some(-1.0));
    assert_eq!(
        right.predicate,
        Predicate::simple("f0", SimpleOperator::GreaterThan, "0.5")
    );

    assert_eq!(evaluate_tree(tree, &record([("f0", "0.5")])), Some(1.0));
    assert_eq!(evaluate_tree(tree, &record([("f0", "0.75")])), Some(-1.0));
}

#[rstest]
#[case(None, &["0", "1"], DataType::Integer)]
#[case(Some(vec!["no".to_owned(), "yes".to_owned()]), &["no", "yes"], DataType::String)]
fn binary_classification(
    #[case] categories: Option<Vec<String>>,
    #[case] values: &[&str],
    #[case] data_type: DataType,
) {
    let text = ModelText::new("binary sigmoid:1.0")
        .feature("x", "[0:10]")
        .tree(LgbTree::numeric_split(0, 2.0, -0.4, 0.6))
        .tree(LgbTree::numeric_split(0, 7.0, -0.1, 0.3));
    let model = load(&text);
    assert_eq!(
        model.objective().map(ObjectiveFunction::kind),
        Some(ObjectiveKind::BinomialLogisticRegression { sigmoid: 1.0 })
    );

    let options = ConvertOptions {
        target_categories: categories,
        ..ConvertOptions::default()
    };
    let pmml = model.encode_pmml(&options).unwrap();

    let target = pmml.data_field("_target").unwrap();
    assert_eq!(target.op_type, OpType::Categorical);
    assert_eq!(target.data_type, data_type);
    assert_eq!(target.values, values);

    let chain = mining(&pmml.model);
    assert_eq!(chain.mining_function, MiningFunction::Classification);
    assert_eq!(chain.segmentation.multiple_model_method, MultipleModelMethod::ModelChain);

    let ensemble = mining(&chain.segmentation.segments[0].model);
    let output = &ensemble.output.as_ref().unwrap().fields[0];
    assert_eq!(output.name, RAW_SCORE_FIELD);
    assert!(!output.is_final_result);
    assert_abs_diff_eq!(
        evaluate_sum(&chain.segmentation.segments[0].model, &record([("x", "8")])).unwrap(),
        0.9,
        epsilon = TOLERANCE
    );

    let link = regression(&chain.segmentation.segments[1].model);
    assert_eq!(link.normalization_method, NormalizationMethod::Logit);
    assert_eq!(link.regression_tables[0].target_category.as_deref(), Some(values[1]));
    assert_eq!(link.regression_tables[0].intercept, 0.0);
    assert_eq!(link.regression_tables[0].numeric_predictors[0].coefficient, 1.0);
    assert_eq!(link.regression_tables[1].target_category.as_deref(), Some(values[0]));
    let probabilities: Vec<_> = link
        .output
        .as_ref()
        .unwrap()
        .fields
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(
        probabilities,
        values.iter().map(|v| format!("probability({v})")).collect::<Vec<_>>()
    );
}

#[test]
fn binary_classification_rejects_wrong_categories() {
    let text = ModelText::new("binary sigmoid:1")
        .feature("x", "[0:10]")
        .tree(LgbTree::stump(0.1));
    let options = ConvertOptions {
        target_categories: Some(vec!["a".into(), "b".into(), "c".into()]),
        ..ConvertOptions::default()
    };
    let err = load(&text).encode_pmml(&options).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::TargetCategoryMismatch { expected: 2, actual: 3 }
    ));
}

#[test]
fn multiclass_trees_are_split_by_class() {
    let text = ModelText::new("multiclass num_class:3")
        .num_class(3)
        .feature("x", "[0:1]")
        .trees((0..9).map(|i| LgbTree::stump(i as f64)));
    let model = load(&text);
    let input = record([]);

    let pmml = model.encode_pmml(&ConvertOptions::default()).unwrap();
    let chain = mining(&pmml.model);
    assert_eq!(chain.segmentation.segments.len(), 4);
    for (class, expected) in [(0, 9.0), (1, 12.0), (2, 15.0)] {
        let segment = &chain.segmentation.segments[class].model;
        assert_eq!(evaluate_sum(segment, &input), Some(expected));
        let output = &mining(segment).output.as_ref().unwrap().fields[0];
        assert_eq!(output.name, format!("{RAW_SCORE_FIELD}({class})"));
    }
    let link = regression(&chain.segmentation.segments[3].model);
    assert_eq!(link.normalization_method, NormalizationMethod::Softmax);
    assert_eq!(link.regression_tables.len(), 3);

    let options = ConvertOptions::builder().num_iteration(2).build().unwrap();
    let pmml = model.encode_pmml(&options).unwrap();
    let first = &mining(&pmml.model).segmentation.segments[0].model;
    assert_eq!(evaluate_sum(first, &input), Some(3.0));
}

#[test]
fn multiclass_tree_count_must_divide() {
    let text = ModelText::new("multiclass num_class:3")
        .num_class(3)
        .feature("x", "[0:1]")
        .trees((0..8).map(|i| LgbTree::stump(i as f64)));
    let err = load(&text).encode_pmml(&ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::TreeCountNotDivisible { trees: 8, num_class: 3 }
    ));
}

#[test]
fn num_iteration_limits_trees() {
    let text = ModelText::new("regression")
        .feature("x", "[0:1]")
        .trees([1.0, 2.0, 4.0].map(LgbTree::stump));
    let model = load(&text);

    let options = ConvertOptions::builder().num_iteration(2).build().unwrap();
    let pmml = model.encode_pmml(&options).unwrap();
    assert_eq!(evaluate_sum(&pmml.model, &record([])), Some(3.0));

    let options = ConvertOptions::builder().num_iteration(5).build().unwrap();
    let err = model.encode_pmml(&options).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::TreeLimitExceeded { limit: 5, available: 3 }
    ));
}

#[test]
fn average_output_averages_trees() {
    let text = ModelText::new("regression")
        .average_output()
        .feature("x", "[0:1]")
        .trees([1.0, 3.0].map(LgbTree::stump));
    let pmml = load(&text).encode_pmml(&ConvertOptions::default()).unwrap();
    assert_eq!(
        mining(&pmml.model).segmentation.multiple_model_method,
        MultipleModelMethod::Average
    );
}

#[test]
fn poisson_exponentiates_raw_score() {
    let text = ModelText::new("poisson")
        .feature("x", "[0:3]")
        .tree(LgbTree::numeric_split(0, 1.0, 0.5, 1.5));
    let pmml = load(&text).encode_pmml(&ConvertOptions::default()).unwrap();

    let chain = mining(&pmml.model);
    assert_eq!(chain.mining_function, MiningFunction::Regression);
    let link = regression(&chain.segmentation.segments[1].model);
    assert_eq!(link.normalization_method, NormalizationMethod::Exp);
    assert_eq!(link.regression_tables[0].numeric_predictors[0].name, RAW_SCORE_FIELD);
}

#[test]
fn custom_objective_needs_replacement() {
    let text = ModelText::custom()
        .feature("x", "[0:3]")
        .tree(LgbTree::numeric_split(0, 1.0, -1.0, 1.0));
    let mut model = load(&text);
    assert!(model.objective().is_none());
    assert!(matches!(
        model.encode_pmml(&ConvertOptions::default()),
        Err(ConversionError::MissingObjective)
    ));

    model.set_objective(Some(ObjectiveFunction::new(
        "binary",
        ObjectiveKind::BinomialLogisticRegression { sigmoid: 2.0 },
        false,
    )));
    let pmml = model.encode_pmml(&ConvertOptions::default()).unwrap();
    let link = regression(&mining(&pmml.model).segmentation.segments[1].model);
    assert_eq!(link.regression_tables[0].numeric_predictors[0].coefficient, 2.0);
}

#[test]
fn direct_categories_without_pandas_lists() {
    let text = ModelText::new("regression")
        .feature("c", "-1:0:5:2")
        .tree(LgbTree::categorical_split(0, &[5], 1.0, 2.0))
        .pandas_categorical("null");
    let model = load(&text);
    assert!(model.pandas_categorical.is_empty());

    let schema = model.encode_schema(None, None).unwrap();
    assert_eq!(
        schema.feature(0),
        Some(&Feature::DirectCategorical {
            name: "c".into(),
            categories: vec![0, 2, 5],
        })
    );

    let pmml = model.encode_pmml(&options(false)).unwrap();
    let root = &tree(&mining(&pmml.model).segmentation.segments[0].model).node;
    assert_eq!(root.nodes[0].predicate, Predicate::simple("c", SimpleOperator::Equal, "5"));
    assert_eq!(evaluate_sum(&pmml.model, &record([("c", "2")])), Some(2.0));
}

#[test]
fn pandas_list_count_must_match() {
    let text = ModelText::new("regression")
        .feature("a", "0:1")
        .feature("b", "0:1:2")
        .tree(LgbTree::stump(0.0))
        .pandas_categorical(r#"[["x", "y"]]"#);
    let err = LgbModel::from_string(&text.render()).unwrap_err();
    assert!(matches!(
        err,
        ParseError::PandasCategoricalMismatch { expected: 2, actual: 1 }
    ));
}

#[test]
fn numeric_split_on_category_list_downgrades_feature() {
    let text = ModelText::new("regression")
        .feature("a", "0:1:2")
        .feature("b", "0:1")
        .tree(LgbTree::numeric_split(0, 1.5, 0.0, 1.0))
        .pandas_categorical(r#"[["lo", "mid", "hi"], [true, false]]"#);
    let model = load(&text);
    let schema = model.encode_schema(None, None).unwrap();

    assert!(matches!(
        schema.feature(0),
        Some(Feature::Continuous { data_type: DataType::Double, .. })
    ));
    // The downgraded feature still consumed the first category list
    match schema.feature(1) {
        Some(Feature::Categorical { labels, data_type, .. }) => {
            assert_eq!(labels, &["true", "false"]);
            assert_eq!(*data_type, DataType::Boolean);
        }
        other => panic!("unexpected feature {other:?}"),
    }
}

#[test]
fn rejects_unsupported_dumps() {
    let text = ModelText::new("regression")
        .version("v1")
        .feature("x", "[0:1]")
        .tree(LgbTree::stump(0.0));
    assert!(matches!(
        LgbModel::from_string(&text.render()),
        Err(ParseError::UnsupportedVersion(v)) if v == "v1"
    ));

    let text = ModelText::new("unknown_loss")
        .feature("x", "[0:1]")
        .tree(LgbTree::stump(0.0));
    assert!(matches!(
        LgbModel::from_string(&text.render()),
        Err(ParseError::UnknownObjective(name)) if name == "unknown_loss"
    ));

    assert!(matches!(
        LgbModel::from_string("Tree=0\nnum_leaves=1\nleaf_value=1\n"),
        Err(ParseError::UnexpectedSection { .. })
    ));
    assert!(matches!(
        LgbModel::from_string("\n\n"),
        Err(ParseError::UnexpectedEnd(_))
    ));
}

#[test]
fn version_line_is_optional() {
    let text = ModelText::new("regression")
        .unversioned()
        .feature("x", "[0:1]")
        .tree(LgbTree::stump(1.5))
        .render();
    assert!(!text.contains("version="));

    let model = LgbModel::from_string(&text).unwrap();
    assert_eq!(model.header.version, None);
    assert_eq!(model.num_trees(), 1);
    assert!(model.encode_pmml(&ConvertOptions::default()).is_ok());
}

#[rstest]
#[case::num_class(2, 3, "num_class")]
#[case::trees_per_iteration(3, 1, "num_tree_per_iteration")]
fn multiclass_header_must_match_objective(
    #[case] num_class: usize,
    #[case] trees_per_iteration: usize,
    #[case] field: &str,
) {
    let text = ModelText::new("multiclass num_class:3")
        .num_class(num_class)
        .feature("x", "[0:1]")
        .trees([0.1, 0.2, 0.3].map(LgbTree::stump))
        .render()
        .replace(
            &format!("num_tree_per_iteration={num_class}"),
            &format!("num_tree_per_iteration={trees_per_iteration}"),
        );
    match LgbModel::from_string(&text) {
        Err(ParseError::ClassCountMismatch { field: f, expected, .. }) => {
            assert_eq!(f, field);
            assert_eq!(expected, 3);
        }
        other => panic!("expected a class count mismatch, got {other:?}"),
    }
}

#[test]
fn tree_numbering_gap_ends_trees() {
    let text = ModelText::new("regression")
        .feature("x", "[0:1]")
        .trees([1.0, 2.0, 3.0].map(LgbTree::stump))
        .render()
        .replace("Tree=1\n", "Tree=7\n");
    let model = LgbModel::from_string(&text).unwrap();
    assert_eq!(model.num_trees(), 1);
}

#[test]
fn nan_as_missing_can_be_disabled() {
    let text = ModelText::new("regression")
        .feature("x", "[0:3]")
        .tree(LgbTree::numeric_split(0, 1.0, 0.5, 1.5));
    let options = ConvertOptions::builder().nan_as_missing(false).build().unwrap();
    let pmml = load(&text).encode_pmml(&options).unwrap();
    assert!(pmml.data_field("x").unwrap().missing_values.is_empty());
}

#[test]
fn reconcile_declared_schema() {
    let text = ModelText::new("regression")
        .feature("a", "[0:1]")
        .feature("b", "[0:9]")
        .feature("c", "[0:9]")
        .tree(LgbTree::categorical_split(0, &[1], -1.0, 1.0))
        .tree(LgbTree::numeric_split(1, 4.5, 0.0, 2.0))
        .tree(LgbTree::numeric_split(2, 1.0000000180025095e-35, 0.25, 0.75));
    let model = load(&text);

    let label = Label::Continuous {
        name: Some("y".into()),
        data_type: DataType::Double,
    };
    let declared = Schema::new(
        label,
        vec![
            Some(Feature::Binary {
                name: "a".into(),
                value: "1".into(),
            }),
            Some(Feature::Categorical {
                name: "b".into(),
                data_type: DataType::String,
                labels: vec!["p".into(), "q".into()],
            }),
            Some(Feature::Continuous {
                name: "c".into(),
                data_type: DataType::Integer,
                interval: None,
            }),
        ],
    );

    let schema = model.reconcile_schema(declared.clone()).unwrap();
    assert_eq!(
        schema.feature(0),
        Some(&Feature::DirectCategorical {
            name: "a".into(),
            categories: vec![0, 1],
        })
    );
    assert!(matches!(
        schema.feature(1),
        Some(Feature::Continuous { data_type: DataType::String, .. })
    ));

    let pmml = model.encode_pmml_with_schema(&schema, &options(false)).unwrap();
    let segments = &mining(&pmml.model).segmentation.segments;
    let zero_split = &tree(&segments[2].model).node.nodes[0].predicate;
    assert_eq!(zero_split, &Predicate::simple("c", SimpleOperator::LessOrEqual, "0"));
    assert_eq!(pmml.data_field("y").map(|f| f.op_type), Some(OpType::Continuous));

    let short = Schema::new(declared.label().clone(), declared.into_features()[..2].to_vec());
    assert!(matches!(
        model.reconcile_schema(short),
        Err(ConversionError::SchemaSizeMismatch { expected: 3, actual: 2 })
    ));
}
