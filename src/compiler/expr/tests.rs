#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::super::*;

    fn sample() -> Expr {
        Expr::inst(
            "AxisDriverService",
            vec![
                Expr::inst("Timer", vec!["TC1".into(), Expr::Int(3)]),
                "TheAxisDriverPrecisionParams".into(),
                Expr::list(vec![Expr::ch('X'), Expr::Bool(false)]),
            ],
        )
    }

    #[test]
    fn leaves() {
        assert_eq!(Expr::from("Foo").render(Indent::Flat), "Foo");
        assert_eq!(Expr::Int(-32).render(Indent::Flat), "-32");
        assert_eq!(Expr::Bool(true).render(Indent::Level(2)), "true");
        assert_eq!(Expr::ch('Z').render(Indent::Flat), "'Z'");
        assert_eq!(Expr::ch('\'').render(Indent::Flat), "'\\''");
    }

    #[test]
    fn flat_render() {
        assert_eq!(
            sample().render(Indent::Flat),
            "AxisDriverService<Timer<TC1, 3>, TheAxisDriverPrecisionParams, MakeTypeList<'X', false>>"
        );
    }

    #[test]
    fn indented_render() {
        let expected = "AxisDriverService<
    Timer<
        TC1,
        3
    >,
    TheAxisDriverPrecisionParams,
    MakeTypeList<
        'X',
        false
    >
>";
        assert_eq!(sample().render(Indent::Level(0)), expected);
    }

    #[test]
    fn indented_render_at_deeper_level() {
        let e = Expr::inst("A", vec!["b".into()]);
        assert_eq!(e.render(Indent::Level(1)), "A<\n        b\n    >");
    }

    #[test]
    fn empty_arguments() {
        let e = Expr::list(vec![]);
        assert!(e.is_list());
        assert_eq!(e.render(Indent::Flat), "MakeTypeList<>");
        assert_eq!(e.render(Indent::Level(0)), "MakeTypeList<>");
    }

    #[test]
    fn display_is_flat() {
        assert_eq!(format!("{}", sample()), sample().render(Indent::Flat));
    }

    fn strip(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn arb_expr() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            "[A-Za-z_][A-Za-z0-9_]{0,8}".prop_map(Expr::Literal),
            any::<i64>().prop_map(Expr::Int),
            any::<bool>().prop_map(Expr::Bool),
            proptest::char::range('A', 'Z').prop_map(Expr::Char),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            ("[A-Z][A-Za-z0-9]{0,8}", prop::collection::vec(inner, 0..6))
                .prop_map(|(name, args)| Expr::inst(name, args))
        })
    }

    proptest! {
        #[test]
        fn layouts_share_token_stream(e in arb_expr(), level in 0usize..4) {
            let flat = e.render(Indent::Flat);
            let indented = e.render(Indent::Level(level));
            prop_assert_eq!(strip(&flat), strip(&indented));
        }
    }
}
