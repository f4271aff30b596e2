use super::*;
use crate::filter::{FilterParser, Value, ValueList};

fn parse(input: &str) -> Expr {
    FilterParser::parse(input).unwrap()
}

fn render_as(input: &str, backend: BackendKind) -> String {
    render(&parse(input), backend, None).unwrap()
}

/// The tree with source parentheses removed; renderers re-derive them.
fn strip_groups(expr: &Expr) -> Expr {
    match expr.ungrouped() {
        Expr::And { left, right } => Expr::and(strip_groups(left), strip_groups(right)),
        Expr::Or { left, right } => Expr::or(strip_groups(left), strip_groups(right)),
        other => other.clone(),
    }
}

fn render_err(input: &str, backend: BackendKind) -> RenderError {
    render(&parse(input), backend, None).unwrap_err()
}

// ==================== Backend Names ====================

#[test]
fn test_backend_from_str() {
    assert_eq!("sql".parse::<BackendKind>().unwrap(), BackendKind::Sql);
    assert_eq!("PgVector".parse::<BackendKind>().unwrap(), BackendKind::PgVector);
    assert_eq!("NEO4J".parse::<BackendKind>().unwrap(), BackendKind::Neo4j);
}

#[test]
fn test_backend_from_str_suggests() {
    let err = "mongodb".parse::<BackendKind>().unwrap_err();
    assert_eq!(err.suggestion, Some("mongo"));
    assert_eq!(err.to_string(), "unknown backend 'mongodb' (did you mean 'mongo'?)");

    let err = "elasticsearch".parse::<BackendKind>().unwrap_err();
    assert_eq!(err.suggestion, None);
    assert_eq!(err.to_string(), "unknown backend 'elasticsearch'");
}

#[test]
fn test_backend_display_round_trips() {
    for backend in BackendKind::ALL {
        assert_eq!(backend.to_string().parse::<BackendKind>().unwrap(), backend);
    }
}

#[test]
fn test_backend_serde_names() {
    assert_eq!(
        serde_json::to_string(&BackendKind::PgVector).unwrap(),
        "\"pgvector\""
    );
    let kind: BackendKind = serde_json::from_str("\"chroma\"").unwrap();
    assert_eq!(kind, BackendKind::Chroma);
}

// ==================== Text ====================

#[test]
fn test_text_canonical_spelling() {
    assert_eq!(
        render_as("country == \"BG\" && year >= 2020", BackendKind::Text),
        "country == 'BG' AND year >= 2020"
    );
    assert_eq!(
        render_as("x nin [1, 2] or y not in ['a']", BackendKind::Text),
        "x NOT IN [1, 2] OR y NOT IN ['a']"
    );
}

#[test]
fn test_text_values() {
    assert_eq!(render_as("x == -5", BackendKind::Text), "x == -5");
    assert_eq!(render_as("x == +5", BackendKind::Text), "x == 5");
    assert_eq!(render_as("x == 3.0", BackendKind::Text), "x == 3.0");
    assert_eq!(render_as("x == 0.25", BackendKind::Text), "x == 0.25");
    assert_eq!(render_as("x == 'foo' 'bar'", BackendKind::Text), "x == 'foobar'");
    assert_eq!(render_as("x == FALSE", BackendKind::Text), "x == false");
    assert_eq!(render_as("x == \"O'Brien\"", BackendKind::Text), r"x == 'O\'Brien'");
}

#[test]
fn test_text_keys() {
    assert_eq!(render_as("author.name == 'a'", BackendKind::Text), "author.name == 'a'");
    assert_eq!(
        render_as("'foo bar 1' == 'x'", BackendKind::Text),
        "\"foo bar 1\" == 'x'"
    );
    assert_eq!(render_as("\"country\" == 'x'", BackendKind::Text), "\"country\" == 'x'");
}

#[test]
fn test_text_minimal_parentheses() {
    assert_eq!(
        render_as("((a == 1)) AND (b == 2)", BackendKind::Text),
        "a == 1 AND b == 2"
    );
    assert_eq!(
        render_as("(a == 1 OR b == 2) AND c == 3", BackendKind::Text),
        "(a == 1 OR b == 2) AND c == 3"
    );
    assert_eq!(
        render_as("a == 1 AND b == 2 OR c == 3", BackendKind::Text),
        "a == 1 AND b == 2 OR c == 3"
    );
    assert_eq!(
        render_as("a == 1 AND (b == 2 AND c == 3)", BackendKind::Text),
        "a == 1 AND (b == 2 AND c == 3)"
    );
    assert_eq!(
        render_as("(a == 1 AND b == 2) AND c == 3", BackendKind::Text),
        "a == 1 AND b == 2 AND c == 3"
    );
}

#[test]
fn test_text_round_trip() {
    let inputs = [
        "country == 'BG'",
        "(country == 'BG' && year == 2020) || (country == 'NL')",
        "\"foo bar 1\" == 'bar.foo'",
        r"path == 'C:\\temp' AND quote == 'it\'s'",
        r"pattern == 'a\d'",
        "a == 1 OR (b == 2 OR c IN [1, -2.5, 'x', true])",
        "meta.year NOT IN [2019, 2020] AND NOT_A_KEYWORD != false",
        "x == -9223372036854775808",
    ];
    for input in inputs {
        let expr = parse(input);
        let text = render(&expr, BackendKind::Text, None).unwrap();
        let reparsed = FilterParser::parse(&text)
            .unwrap_or_else(|e| panic!("{text:?} does not re-parse: {e}"));
        assert_eq!(
            render(&reparsed, BackendKind::Text, None).unwrap(),
            text,
            "round trip of {input:?}"
        );
        assert_eq!(strip_groups(&reparsed), strip_groups(&expr), "tree of {input:?}");
    }
}

#[test]
fn test_text_rejects_line_breaks() {
    let expr = Expr::eq(Key::field("note"), "two\nlines");
    let err = render(&expr, BackendKind::Text, None).unwrap_err();
    assert_eq!(
        err,
        RenderError::unsupported(BackendKind::Text, "a string containing a line break")
    );
}

#[test]
fn test_text_quotes_builder_keys_that_are_not_identifiers() {
    let expr = Expr::eq(Key::field("AND"), 1);
    assert_eq!(render(&expr, BackendKind::Text, None).unwrap(), "\"AND\" == 1");

    let expr = Expr::eq(Key::nested("a", "b c"), 1);
    assert!(render(&expr, BackendKind::Text, None).is_err());
}

// ==================== SQL ====================

#[test]
fn test_sql_escapes_quotes() {
    let expr = Expr::eq(Key::field("name"), Value::Text("O'Brien".to_string()));
    assert_eq!(
        render(&expr, BackendKind::Sql, None).unwrap(),
        "metadata->>'name' = 'O''Brien'"
    );
}

#[test]
fn test_sql_injection_stays_inside_literals() {
    assert_eq!(
        render_as("name == \"x' OR '1'='1\"", BackendKind::Sql),
        "metadata->>'name' = 'x'' OR ''1''=''1'"
    );
    assert_eq!(
        render_as("\"k'ey\" == 1", BackendKind::Sql),
        "(metadata->>'k''ey')::numeric = 1"
    );
}

#[test]
fn test_sql_casts_and_operators() {
    assert_eq!(
        render_as("year >= 2020 AND price < 9.99", BackendKind::Sql),
        "(metadata->>'year')::numeric >= 2020 AND (metadata->>'price')::numeric < 9.99"
    );
    assert_eq!(
        render_as("active != true", BackendKind::Sql),
        "(metadata->>'active')::boolean <> true"
    );
    assert_eq!(
        render_as("author.name == 'x'", BackendKind::Sql),
        "metadata->'author'->>'name' = 'x'"
    );
}

#[test]
fn test_sql_membership() {
    assert_eq!(
        render_as("country IN ['BG', 'NL']", BackendKind::Sql),
        "metadata->>'country' IN ('BG', 'NL')"
    );
    assert_eq!(
        render_as("year NIN [2019, 2020.5]", BackendKind::Sql),
        "(metadata->>'year')::numeric NOT IN (2019, 2020.5)"
    );
}

#[test]
fn test_sql_rejects_mixed_lists() {
    assert_eq!(
        render_err("x IN [1, 'a']", BackendKind::Sql),
        RenderError::unsupported(BackendKind::Sql, "an IN list mixing integer and text values")
    );
}

#[test]
fn test_sql_precedence() {
    assert_eq!(
        render_as("(country == 'BG' && year == 2020) || (country == 'NL')", BackendKind::Sql),
        "metadata->>'country' = 'BG' AND (metadata->>'year')::numeric = 2020 \
         OR metadata->>'country' = 'NL'"
    );
    assert_eq!(
        render_as("a == 'x' && (b == 'y' || c == 'z')", BackendKind::Sql),
        "metadata->>'a' = 'x' AND (metadata->>'b' = 'y' OR metadata->>'c' = 'z')"
    );
}

#[test]
fn test_sql_metadata_column() {
    let config = RenderConfig {
        metadata_column: "Doc Meta".to_string(),
        ..RenderConfig::default()
    };
    assert_eq!(
        render_with(&parse("a == 'x'"), BackendKind::Sql, &config).unwrap(),
        "\"Doc Meta\"->>'a' = 'x'"
    );
}

#[test]
fn test_sql_reserved_metadata_column_is_quoted() {
    let config = RenderConfig {
        metadata_column: "user".to_string(),
        ..RenderConfig::default()
    };
    assert_eq!(
        render_with(&parse("a == 1"), BackendKind::Sql, &config).unwrap(),
        "(\"user\"->>'a')::numeric = 1"
    );
}

// ==================== PgVector ====================

#[test]
fn test_pgvector_jsonpath() {
    assert_eq!(
        render_as("country == 'BG' && year == 2020", BackendKind::PgVector),
        "$.country == \"BG\" && $.year == 2020"
    );
    assert_eq!(
        render_as("(country == 'BG' && year == 2020) || (country == 'NL')", BackendKind::PgVector),
        "$.country == \"BG\" && $.year == 2020 || $.country == \"NL\""
    );
    assert_eq!(
        render_as("author.name != 'x'", BackendKind::PgVector),
        "$.author.name != \"x\""
    );
}

#[test]
fn test_pgvector_membership() {
    assert_eq!(
        render_as("genre IN ['drama', 'comedy']", BackendKind::PgVector),
        "($.genre == \"drama\" || $.genre == \"comedy\")"
    );
    assert_eq!(
        render_as("year NOT IN [2019, 2020]", BackendKind::PgVector),
        "!($.year == 2019 || $.year == 2020)"
    );
}

#[test]
fn test_pgvector_escapes_strings_as_json() {
    assert_eq!(
        render_as(r#"title == 'say "hi"\\'"#, BackendKind::PgVector),
        r#"$.title == "say \"hi\"\\""#
    );
}

#[test]
fn test_pgvector_predicate_quotes_path() {
    let config = RenderConfig::default();
    let expr = parse("name == \"O'Brien\"");
    assert_eq!(
        PgVectorRenderer::new(&config).render_predicate(&expr).unwrap(),
        "metadata::jsonb @@ '$.name == \"O''Brien\"'::jsonpath"
    );
}

// ==================== Neo4j ====================

#[test]
fn test_neo4j_cypher() {
    assert_eq!(
        render_as("country == 'BG' && year >= 2020", BackendKind::Neo4j),
        "node.`metadata.country` = 'BG' AND node.`metadata.year` >= 2020"
    );
    assert_eq!(
        render_as("author.name != 'x'", BackendKind::Neo4j),
        "node.`metadata.author.name` <> 'x'"
    );
}

#[test]
fn test_neo4j_membership() {
    assert_eq!(
        render_as("year IN [2019, 2020]", BackendKind::Neo4j),
        "node.`metadata.year` IN [2019, 2020]"
    );
    assert_eq!(
        render_as("year NIN [2019] OR x == 1", BackendKind::Neo4j),
        "NOT node.`metadata.year` IN [2019] OR node.`metadata.x` = 1"
    );
}

#[test]
fn test_neo4j_node_alias() {
    let config = RenderConfig {
        node_alias: "doc".to_string(),
        ..RenderConfig::default()
    };
    assert_eq!(
        render_with(&parse("author.name == 'Ann'"), BackendKind::Neo4j, &config).unwrap(),
        "doc.`metadata.author.name` = 'Ann'"
    );
}

#[test]
fn test_neo4j_reserved_node_alias_is_quoted() {
    let config = RenderConfig {
        node_alias: "match".to_string(),
        ..RenderConfig::default()
    };
    assert_eq!(
        render_with(&parse("a == 1"), BackendKind::Neo4j, &config).unwrap(),
        "`match`.`metadata.a` = 1"
    );
}

// ==================== Mongo / Chroma ====================

#[test]
fn test_mongo_document() {
    assert_eq!(
        render_as("country == 'BG' && year >= 2020", BackendKind::Mongo),
        r#"{"$and":[{"country":{"$eq":"BG"}},{"year":{"$gte":2020}}]}"#
    );
    assert_eq!(
        render_as("genre NOT IN ['drama', 'comedy']", BackendKind::Mongo),
        r#"{"genre":{"$nin":["drama","comedy"]}}"#
    );
    assert_eq!(
        render_as("author.name == 'x'", BackendKind::Mongo),
        r#"{"author.name":{"$eq":"x"}}"#
    );
}

#[test]
fn test_mongo_rejects_ambiguous_keys() {
    assert!(matches!(
        render_err("'a.b' == 1", BackendKind::Mongo),
        RenderError::UnsupportedConstruct { backend: BackendKind::Mongo, .. }
    ));
    assert!(matches!(
        render_err("'$where' == 1", BackendKind::Mongo),
        RenderError::UnsupportedConstruct { .. }
    ));
}

#[test]
fn test_chroma_rejects_membership() {
    assert_eq!(
        render_err("year IN [2020]", BackendKind::Chroma),
        RenderError::unsupported(BackendKind::Chroma, "IN")
    );
    assert_eq!(
        render_err("a == 1 OR year NIN [2020]", BackendKind::Chroma).to_string(),
        "chroma backend cannot render NOT IN"
    );
}

#[test]
fn test_chroma_document() {
    assert_eq!(
        render_as("year > 2019 || year < 2000", BackendKind::Chroma),
        r#"{"$or":[{"year":{"$gt":2019}},{"year":{"$lt":2000}}]}"#
    );
}

// ==================== Shared ====================

#[test]
fn test_field_map_applies_to_every_backend() {
    let mut field_map = FieldMap::new();
    field_map.insert("country".to_string(), "country_code".to_string());
    field_map.insert("author.name".to_string(), "author_name".to_string());
    let expr = parse("country == 'BG' && author.name == 'Ann'");

    let expected = [
        (BackendKind::Text, "country_code == 'BG' AND author_name == 'Ann'"),
        (
            BackendKind::Sql,
            "metadata->>'country_code' = 'BG' AND metadata->>'author_name' = 'Ann'",
        ),
        (
            BackendKind::PgVector,
            "$.country_code == \"BG\" && $.author_name == \"Ann\"",
        ),
        (
            BackendKind::Neo4j,
            "node.`metadata.country_code` = 'BG' AND node.`metadata.author_name` = 'Ann'",
        ),
        (
            BackendKind::Mongo,
            r#"{"$and":[{"country_code":{"$eq":"BG"}},{"author_name":{"$eq":"Ann"}}]}"#,
        ),
    ];
    for (backend, output) in expected {
        assert_eq!(render(&expr, backend, Some(&field_map)).unwrap(), output, "{backend}");
    }
}

#[test]
fn test_long_flat_chains_render_on_every_backend() {
    let input = vec!["a == 1"; 2000].join(" OR ");
    let expr = parse(&input);

    assert_eq!(render(&expr, BackendKind::Text, None).unwrap(), input);
    let sql = render(&expr, BackendKind::Sql, None).unwrap();
    assert_eq!(sql.matches(" OR ").count(), 1999);
    assert!(!sql.contains("(("));

    let mongo = JsonRenderer::new(&RenderConfig::default(), JsonDialect::Mongo)
        .to_value(&expr)
        .unwrap();
    assert_eq!(mongo["$or"].as_array().map(Vec::len), Some(2000));
}

#[test]
fn test_rendering_is_idempotent() {
    let expr = parse("(a == 1 || b IN ['x', 'y']) && c.d != 2.5 && \"e f\" NIN [true]");
    for backend in BackendKind::ALL {
        let first = render(&expr, backend, None);
        let second = render(&expr, backend, None);
        assert_eq!(first, second, "{backend}");
    }
}

#[test]
fn test_non_finite_decimals_are_rejected() {
    let expr = Expr::eq(Key::field("x"), f64::NAN);
    for backend in BackendKind::ALL {
        assert!(
            matches!(
                render(&expr, backend, None),
                Err(RenderError::UnsupportedConstruct { .. })
            ),
            "{backend}"
        );
    }
}

#[test]
fn test_renderer_trait_objects() {
    let config = RenderConfig::default();
    let renderers: Vec<Box<dyn Renderer + '_>> = vec![
        Box::new(TextRenderer::new(&config)),
        Box::new(SqlRenderer::new(&config)),
        Box::new(PgVectorRenderer::new(&config)),
        Box::new(Neo4jRenderer::new(&config)),
        Box::new(JsonRenderer::new(&config, JsonDialect::Mongo)),
        Box::new(JsonRenderer::new(&config, JsonDialect::Chroma)),
    ];
    let expr = Expr::in_list(Key::field("x"), ValueList::single(Value::Integer(1)));
    for renderer in &renderers {
        assert_eq!(
            renderer.render(&expr),
            render(&expr, renderer.backend(), None),
            "{}",
            renderer.backend()
        );
    }
}

#[test]
fn test_format_decimal() {
    assert_eq!(format_decimal(3.0), "3.0");
    assert_eq!(format_decimal(-0.5), "-0.5");
    assert_eq!(format_decimal(1e21), "1000000000000000000000.0");
}

#[test]
fn test_render_config_defaults_from_empty_toml_like_json() {
    let config: RenderConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, RenderConfig::default());
    let config: RenderConfig =
        serde_json::from_str(r#"{"field_map": {"a": "b"}, "node_alias": "n"}"#).unwrap();
    assert_eq!(config.field_map.get("a").map(String::as_str), Some("b"));
    assert_eq!(config.node_alias, "n");
    assert_eq!(config.metadata_column, "metadata");
}
