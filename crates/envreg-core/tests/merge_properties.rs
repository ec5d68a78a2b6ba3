use envreg_core::{
    merge_access, merge_access_document, merged, validate, AccessGrant, Environment,
    EnvironmentRecord, ValidationError,
};
use proptest::prelude::*;
use serde_json::json;

fn grant_strategy() -> impl Strategy<Value = AccessGrant> {
    (
        prop_oneof![Just("team-a"), Just("team-b"), Just("team-c"), Just("platform")],
        prop_oneof![Just("developer"), Just("view-only"), Just("administrator")],
    )
        .prop_map(|(group, level)| AccessGrant::new(group, level))
}

fn environment_strategy() -> impl Strategy<Value = Environment> {
    (
        prop_oneof![Just("development"), Just("test"), Just("preproduction"), Just("production")],
        proptest::option::of(proptest::collection::vec(grant_strategy(), 0..4)),
    )
        .prop_map(|(name, access)| Environment {
            name: name.to_string(),
            access,
            ..Environment::default()
        })
}

fn record_strategy() -> impl Strategy<Value = EnvironmentRecord> {
    proptest::collection::vec(environment_strategy(), 0..4).prop_map(|environments| {
        // environment names are unique within a record
        let mut seen = Vec::new();
        let environments = environments
            .into_iter()
            .filter(|env| {
                if seen.contains(&env.name) {
                    false
                } else {
                    seen.push(env.name.clone());
                    true
                }
            })
            .collect();
        EnvironmentRecord {
            environments,
            ..EnvironmentRecord::default()
        }
    })
}

fn env_name_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("development"), Just("test"), Just("production"), Just("sandbox")]
}

proptest! {
    #[test]
    fn prop_merge_is_idempotent(
        record in record_strategy(),
        env in env_name_strategy(),
        grants in proptest::collection::vec(grant_strategy(), 0..6),
    ) {
        let once = merged(record, env, &grants);
        let twice = merged(once.clone(), env, &grants);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_preserves_existing_and_appends_only_new(
        record in record_strategy(),
        env in env_name_strategy(),
        first in proptest::collection::vec(grant_strategy(), 1..4),
        second in proptest::collection::vec(grant_strategy(), 0..6),
    ) {
        let base = merged(record, env, &first);
        let before = base.environment(env).unwrap().grants().to_vec();

        let after_record = merged(base.clone(), env, &second);
        let after = after_record.environment(env).unwrap().grants().to_vec();

        prop_assert_eq!(&after[..before.len()], &before[..]);

        let mut expected_new: Vec<AccessGrant> = Vec::new();
        for grant in &second {
            let known = before.iter().chain(expected_new.iter()).any(|g| g.same_identity(grant));
            if !known {
                expected_new.push(grant.clone());
            }
        }
        prop_assert_eq!(&after[before.len()..], &expected_new[..]);

        // environments other than the target are untouched
        for (old, new) in base.environments.iter().zip(after_record.environments.iter()) {
            if old.name != env {
                prop_assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn prop_missing_environment_is_appended_verbatim(
        record in record_strategy(),
        grants in proptest::collection::vec(grant_strategy(), 0..6),
    ) {
        let mut updated = record.clone();
        let outcome = merge_access(&mut updated, "sandbox", &grants);

        prop_assert!(outcome.environment_created);
        prop_assert_eq!(updated.environments.len(), record.environments.len() + 1);
        prop_assert_eq!(&updated.environments[..record.environments.len()], &record.environments[..]);
        prop_assert_eq!(
            updated.environments.last().unwrap(),
            &Environment::new("sandbox", grants)
        );
    }

    #[test]
    fn prop_document_merge_agrees_with_typed_merge(
        record in record_strategy(),
        env in env_name_strategy(),
        grants in proptest::collection::vec(grant_strategy(), 0..6),
    ) {
        let mut document = record.to_value();
        let outcome = merge_access_document(&mut document, env, &grants).unwrap();

        let mut typed = record;
        let expected = merge_access(&mut typed, env, &grants);
        prop_assert_eq!(outcome, expected);

        let reread = EnvironmentRecord::from_value("orders", document).unwrap();
        prop_assert_eq!(reread.environments.len(), typed.environments.len());
        for (doc_env, typed_env) in reread.environments.iter().zip(typed.environments.iter()) {
            prop_assert_eq!(&doc_env.name, &typed_env.name);
            prop_assert_eq!(doc_env.grants(), typed_env.grants());
        }
    }

    #[test]
    fn prop_merged_record_still_validates(
        record in record_strategy(),
        env in env_name_strategy(),
        grants in proptest::collection::vec(grant_strategy(), 0..6),
    ) {
        let updated = merged(record, env, &grants);
        prop_assert!(validate(&updated.to_value()).is_ok());
    }

    #[test]
    fn prop_missing_or_empty_name_identifies_index(
        valid_before in 0usize..4,
        valid_after in 0usize..3,
        blank in prop_oneof![Just(None), Just(Some("")), Just(Some("   "))],
    ) {
        let mut environments: Vec<_> = (0..valid_before)
            .map(|i| json!({ "name": format!("env-{i}") }))
            .collect();
        environments.push(match blank {
            None => json!({ "access": [] }),
            Some(name) => json!({ "name": name }),
        });
        environments.extend((0..valid_after).map(|i| json!({ "name": format!("later-{i}") })));

        let err = validate(&json!({ "environments": environments })).unwrap_err();
        let expected_path = format!("environments[{valid_before}].name");
        prop_assert_eq!(err.path().to_string(), expected_path);
        match blank {
            None => {
                prop_assert!(matches!(err, ValidationError::InvalidShape { .. }), "expected ValidationError::InvalidShape");
            }
            Some(_) => {
                prop_assert!(matches!(err, ValidationError::InvalidValue { .. }), "expected ValidationError::InvalidValue");
            }
        }
    }

    #[test]
    fn prop_missing_environments_is_shape_error(
        tags in proptest::collection::btree_map("[a-z]{1,8}", "[a-z]{0,8}", 0..4),
    ) {
        let err = validate(&json!({ "tags": tags })).unwrap_err();
        prop_assert!(matches!(err, ValidationError::InvalidShape { .. }), "expected ValidationError::InvalidShape");
        prop_assert_eq!(err.path().to_string(), "environments");
    }
}
