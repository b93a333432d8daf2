//! ORDER BY, OFFSET, LIMIT, EXPLAIN and sequences.

use tessera_tests::prelude::*;

fn order_ids() -> SelectStmt {
    select(core(vec![col("id")]).from_table("orders"))
}

fn ids(values: &[i64]) -> Vec<Document> {
    values.iter().map(|id| row! { "id" => *id }).collect()
}

/// Orders projected to `id` and `total`, ordered by `total`.
fn by_total(direction: OrderDirection) -> SelectStmt {
    select(core(vec![col("id"), col("total")]).from_table("orders"))
        .with_order_by(Path::field("total"), direction)
}

fn totals(values: &[i64]) -> Vec<Document> {
    values
        .iter()
        .map(|id| {
            let total = match id {
                1 => Value::from(30),
                2 => Value::from(12.5),
                3 => Value::from(20),
                5 => Value::from(8),
                _ => Value::Null,
            };
            row! { "id" => *id, "total" => total }
        })
        .collect()
}

mod ordering {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("ordering")
            .fixture("shop.json")
            .step("ascending_puts_null_first", by_total(OrderDirection::Asc), |a| {
                a.returns(totals(&[4, 5, 2, 3, 1])).ordered()
            })
            .step("descending", by_total(OrderDirection::Desc), |a| {
                a.returns(totals(&[1, 3, 2, 5, 4]))
                    .ordered()
                    .plan("table.Scan(orders) | docs.Project(id, total) | docs.SortReverse(total)")
            })
            .step(
                "sort_is_stable",
                select(core(vec![col("id"), col("customer")]).from_table("orders"))
                    .with_order_by(Path::field("customer"), OrderDirection::Asc),
                |a| {
                    a.returns(vec![
                        row! { "id" => 1, "customer" => "ada" },
                        row! { "id" => 3, "customer" => "ada" },
                        row! { "id" => 2, "customer" => "bob" },
                        row! { "id" => 5, "customer" => "bob" },
                        row! { "id" => 4, "customer" => "cyd" },
                    ])
                    .ordered()
                },
            )
            .step(
                "unprojected_key_sorts_as_null",
                order_ids().with_order_by(Path::field("total"), OrderDirection::Desc),
                |a| a.returns(ids(&[1, 2, 3, 4, 5])).ordered(),
            )
    }

    #[test]
    fn test_order_by() {
        scenario().run().unwrap();
    }
}

mod offset_and_limit {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("offset_and_limit")
            .fixture("shop.json")
            .step(
                "window",
                by_total(OrderDirection::Asc).with_offset(lit(1)).with_limit(lit(2)),
                |a| {
                    a.returns(totals(&[5, 2]))
                        .ordered()
                        .plan(
                            "table.Scan(orders) | docs.Project(id, total) | docs.Sort(total) \
                             | docs.Skip(1) | docs.Take(2)",
                        )
                },
            )
            .step(
                "limit_expression",
                order_ids().with_limit(Expr::binary(BinaryOp::Mul, lit(2), lit(1.5))),
                |a| a.returns(ids(&[1, 2, 3])).ordered(),
            )
            .step("limit_zero", order_ids().with_limit(lit(0)), |a| a.empty())
            .step("offset_past_end", order_ids().with_offset(lit(10)), |a| a.empty())
            .step(
                "limit_must_be_a_number",
                order_ids().with_limit(lit("10")),
                |a| {
                    a.error("limit expression must evaluate to a number, got \"text\"")
                        .error_kind(ErrorKind::Evaluation)
                },
            )
            .step(
                "negative_offset",
                order_ids().with_offset(lit(-1)),
                |a| a.error("offset").error_kind(ErrorKind::Evaluation),
            )
            .step(
                "limit_cannot_read_documents",
                order_ids().with_limit(field("id")),
                |a| a.error_kind(ErrorKind::Evaluation),
            )
    }

    #[test]
    fn test_offset_and_limit() {
        scenario().run().unwrap();
    }
}

mod explain {
    use super::*;

    pub fn scenario() -> Scenario {
        let writer = select(
            core(vec![col("id"), Expr::auto_named(Expr::next_value_for("invoice"))]).from_table("orders"),
        );
        Scenario::new("explain")
            .fixture("shop.json")
            .step("explain", Statement::Explain(writer.clone()), |a| {
                a.scalar(
                    "plan",
                    "table.Scan(orders) | docs.Project(id, NEXT VALUE FOR invoice)",
                )
                .read_only(true)
            })
            // Explaining did not advance the sequence.
            .step("first_run", writer.with_limit(lit(1)), |a| {
                a.returns(vec![row! { "id" => 1, "NEXT VALUE FOR invoice" => 1 }])
                    .read_only(false)
            })
            .step(
                "explain_compile_error",
                Statement::Explain(select(core(vec![col("a")]))),
                |a| a.error_kind(ErrorKind::Compile),
            )
    }

    #[test]
    fn test_explain() {
        scenario().run().unwrap();
    }
}

mod sequences {
    use super::*;

    pub fn scenario() -> Scenario {
        let next = || {
            select(
                core(vec![col("id"), Expr::auto_named(Expr::next_value_for("invoice"))])
                    .from_table("orders")
                    .with_where(Expr::equals(field("status"), lit("shipped"))),
            )
        };
        Scenario::new("sequences")
            .fixture("shop.json")
            .step("limit_stops_the_scan", next().with_limit(lit(1)), |a| {
                a.returns(vec![row! { "id" => 1, "NEXT VALUE FOR invoice" => 1 }])
            })
            .step("continues_from_last_value", next(), |a| {
                a.returns(vec![
                    row! { "id" => 1, "NEXT VALUE FOR invoice" => 2 },
                    row! { "id" => 3, "NEXT VALUE FOR invoice" => 3 },
                    row! { "id" => 5, "NEXT VALUE FOR invoice" => 4 },
                ])
                .ordered()
            })
            .step(
                "unknown_sequence",
                select(core(vec![Expr::auto_named(Expr::next_value_for("nope"))])),
                |a| a.error("unknown sequence: nope").error_kind(ErrorKind::Runtime),
            )
    }

    #[test]
    fn test_next_value_for() {
        scenario().run().unwrap();
    }
}
