#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::compiler::{
        config::{Breadcrumb, ConfigNode},
        error::{CompilerError, ConfigError},
        selection::*,
    };

    #[test]
    fn runs_only_the_matching_option() {
        let doc = json!({});
        let node = ConfigNode::root(&doc);
        let mut calls: Vec<String> = vec![];

        let result = Selection::new()
            .option("X", |calls: &mut Vec<String>, _| {
                calls.push("h1".into());
                Ok(1)
            })
            .option("Y", |calls: &mut Vec<String>, _| {
                calls.push("h2".into());
                Ok(2)
            })
            .run("X", &mut calls, &node);

        assert_eq!(result, Ok(1));
        assert_eq!(calls, vec!["h1"]);
    }

    #[test]
    fn unknown_variant_without_default() {
        let doc = json!({});
        let node = ConfigNode::root(&doc);
        let mut calls: Vec<String> = vec![];

        let result = Selection::new()
            .option("X", |calls: &mut Vec<String>, _| {
                calls.push("h1".into());
                Ok(1)
            })
            .option("Y", |calls: &mut Vec<String>, _| {
                calls.push("h2".into());
                Ok(2)
            })
            .run("Z", &mut calls, &node);

        assert_eq!(result, Err(SelectionError::UnknownVariant("Z".into())));
        assert!(calls.is_empty());
    }

    #[test]
    fn default_receives_the_tag() {
        let doc = json!({});
        let node = ConfigNode::root(&doc);

        let result = Selection::new()
            .option("X", |_: &mut (), _| Ok(String::from("x")))
            .default(|_, tag, _| Ok(format!("default {}", tag)))
            .run("Q", &mut (), &node);

        assert_eq!(result, Ok("default Q".to_string()));
    }

    #[test]
    fn shared_handler_for_several_tags() {
        let doc = json!({});
        let node = ConfigNode::root(&doc);

        let sel = || {
            Selection::new().options(&["A", "B"], |_: &mut (), tag, _| Ok(tag.to_string()))
        };
        assert_eq!(sel().tags().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(sel().run("B", &mut (), &node), Ok("B".to_string()));
        assert_eq!(sel().run("A", &mut (), &node), Ok("A".to_string()));
    }

    #[test]
    fn handler_errors_are_passed_through() {
        let doc = json!({"v": "text"});
        let node = ConfigNode::root(&doc);

        let result = Selection::new()
            .option("X", |_: &mut (), node| node.get_int("v"))
            .run("X", &mut (), &node);

        assert_eq!(
            result,
            Err(SelectionError::Handler(CompilerError::new(
                Breadcrumb::new().key("v"),
                ConfigError::WrongType(crate::compiler::error::ValueKind::Integer)
            )))
        );
    }

    #[test]
    #[should_panic]
    fn duplicate_option_panics() {
        let _ = Selection::<(), i32>::new()
            .option("X", |_, _| Ok(1))
            .options(&["Y", "X"], |_, _, _| Ok(2));
    }

    #[test]
    fn do_selection_reads_the_discriminant() {
        let doc = json!({
            "clock": {"_compoundName": "Fast", "rate": 10},
            "other": {"_compoundName": "Slow"}
        });
        let root = ConfigNode::root(&doc);

        let pick = || {
            Selection::new().option("Fast", |_: &mut (), node| node.get_int("rate"))
        };

        assert_eq!(root.do_selection("clock", &mut (), pick()).unwrap(), 10);

        let err = root.do_selection("other", &mut (), pick()).unwrap_err();
        assert_eq!(err.inner(), &ConfigError::UnknownChoice("Slow".into()));
        assert_eq!(err.path().to_string(), "other");

        let err = root.do_selection("missing", &mut (), pick()).unwrap_err();
        assert_eq!(err.inner(), &ConfigError::MissingOrNotAnObject);
    }
}
