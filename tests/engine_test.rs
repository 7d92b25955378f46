// End-to-end checks of the morphology engine against the bundled seed data.

use mizan_lib::{
    AppState, Config, Engine, MizanError, SeedData, TransformationGroup, TransformationRule,
};
use std::sync::Arc;
use std::thread;

fn engine() -> Engine {
    Engine::from_seed(&SeedData::bundled()).unwrap()
}

#[test]
fn sound_roots_round_trip_through_validation() {
    let e = engine();
    let schemes = e.list_schemes().unwrap();
    for root in ["كتب", "درس", "علم", "نصر"] {
        for scheme in &schemes {
            let word = e.generate(root, scheme).unwrap();
            let result = e.validate(root, &word).unwrap();
            assert!(result.valid, "{word} should validate for {root}");
            assert_eq!(result.scheme.as_deref(), Some(scheme.as_str()), "{root} + {scheme}");
        }
    }
}

#[test]
fn weak_roots_follow_bundled_rules() {
    let e = engine();
    let cases = [
        ("قول", "فاعل", "قائل"),
        ("بيع", "فاعل", "بائع"),
        ("قول", "مفعول", "مقول"),
        ("بيع", "مفعول", "مبيع"),
        ("دعو", "فاعل", "داعٍ"),
        ("رمي", "مفعول", "مرميّ"),
        ("دعو", "مفعول", "مدعوّ"),
        ("وعد", "افتعل", "اتّعد"),
        ("وعد", "مفعول", "موعود"),
        ("وقي", "فاعل", "واقٍ"),
        ("طوي", "مفعول", "مطويّ"),
        ("سأل", "فاعل", "سائل"),
    ];
    for (root, scheme, expected) in cases {
        assert_eq!(e.generate(root, scheme).unwrap(), expected, "{root} + {scheme}");
    }
}

#[test]
fn surface_alif_root_matches_underlying_waw() {
    let e = engine();
    e.add_root("قال").unwrap();
    assert_eq!(e.generate("قال", "فاعل").unwrap(), "قائل");
    assert_eq!(e.generate("قال", "مفعول").unwrap(), "مقول");
}

#[test]
fn validation_detects_transformed_words() {
    let e = engine();
    let result = e.validate("رمي", "مرميّ").unwrap();
    assert!(result.valid);
    assert_eq!(result.scheme.as_deref(), Some("مفعول"));

    let raw = e.validate("رمي", "مرموي").unwrap();
    assert!(!raw.valid);
}

#[test]
fn derivatives_accumulate_frequency() {
    let e = engine();
    e.generate("كتب", "فاعل").unwrap();
    e.validate("كتب", "كاتب").unwrap();
    let derivatives = e.derivatives("كتب").unwrap();
    assert_eq!(derivatives.len(), 1);
    assert_eq!(derivatives[0].frequency, 2);

    assert!(e.derivatives("درس").unwrap().is_empty());
    assert!(matches!(e.derivatives("ققق"), Err(MizanError::UnknownRoot(_))));
}

#[test]
fn statistics_density() {
    let e = Engine::from_seed(&SeedData::parse(
        "كتب\nدرس\nعلم\n",
        "فاعل={1}ا{2}{3}\nمفعول=م{1}{2}و{3}\n",
        "",
    ))
    .unwrap();
    for root in ["كتب", "درس", "علم"] {
        e.generate_all(root).unwrap();
    }
    let stats = e.statistics().unwrap();
    assert_eq!(stats.total_roots, 3);
    assert_eq!(stats.total_schemes, 2);
    assert_eq!(stats.total_derivatives, 6);
    assert_eq!(stats.density, 2.0);
}

#[test]
fn listed_roots_are_sorted() {
    let e = engine();
    let roots = e.list_roots().unwrap();
    let mut sorted = roots.clone();
    sorted.sort();
    assert_eq!(roots, sorted);
}

#[test]
fn rule_order_is_honoured_through_the_engine() {
    let e = engine();
    e.put_scheme("test", "{1}{2}{3}").unwrap();
    e.save_group(TransformationGroup::new(
        "naqis_test",
        vec![
            TransformationRule::replace("مي", "X", 1),
            TransformationRule::replace("ي", "ى", 0),
        ],
    ))
    .unwrap();
    // ي->ى runs first, so "مي" never appears
    assert_eq!(e.generate("رمي", "test").unwrap(), "رمى");
}

#[test]
fn concurrent_generation_is_consistent() {
    let e = Arc::new(engine());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let e = Arc::clone(&e);
            thread::spawn(move || {
                for _ in 0..25 {
                    e.generate("كتب", "فاعل").unwrap();
                    e.statistics().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let derivatives = e.derivatives("كتب").unwrap();
    assert_eq!(derivatives.len(), 1);
    assert_eq!(derivatives[0].frequency, 200);
}

#[test]
fn persisted_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());

    {
        let state = AppState::new(config.clone()).unwrap();
        state.engine.add_root("نظر").unwrap();
        state.engine.generate_all("نظر").unwrap();
        state.engine.delete_scheme("فعل").unwrap();
        state
            .engine
            .save_group(TransformationGroup::new(
                "exception_نظر_فاعل",
                vec![TransformationRule::replace_final("ر", 0)],
            ))
            .unwrap();
    }

    let state = AppState::new(config).unwrap();
    let e = &state.engine;
    assert!(e.list_roots().unwrap().contains(&"نظر".to_string()));
    assert!(!e.list_schemes().unwrap().contains(&"فعل".to_string()));
    assert!(e.get_group("exception_نظر_فاعل").is_ok());
    let derivatives = e.derivatives("نظر").unwrap();
    assert_eq!(derivatives.len(), SeedData::bundled().schemes.len());
    assert!(derivatives.iter().any(|d| d.word == "ناظر"));
}

#[test]
fn storage_failure_leaves_memory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());
    let state = AppState::new(config.clone()).unwrap();
    let e = &state.engine;

    let roots_before = e.list_roots().unwrap();
    let schemes_before = e.scheme_details().unwrap();

    // a directory where the database file was makes every connection fail
    std::fs::remove_file(config.db_path()).unwrap();
    std::fs::create_dir(config.db_path()).unwrap();

    assert!(matches!(e.generate("كتب", "فاعل"), Err(MizanError::Storage(_))));
    assert!(matches!(e.add_root("نظر"), Err(MizanError::Storage(_))));
    assert!(matches!(e.put_scheme("فعيل", "{1}ي{2}{3}"), Err(MizanError::Storage(_))));
    assert!(matches!(e.delete_scheme("فاعل"), Err(MizanError::Storage(_))));

    assert!(e.derivatives("كتب").unwrap().is_empty());
    assert_eq!(e.list_roots().unwrap(), roots_before);
    assert_eq!(e.scheme_details().unwrap(), schemes_before);
}

#[test]
fn validation_order_survives_restart_after_deletions() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());

    let (layout, capacity, detected) = {
        let state = AppState::new(config.clone()).unwrap();
        let e = &state.engine;
        for (name, template) in [("فعلان", "{1}{2}{3}ان"), ("فعلى", "{1}{2}{3}ى")] {
            e.put_scheme(name, template).unwrap();
        }
        e.delete_scheme("فعلان").unwrap();
        e.delete_scheme("فعلى").unwrap();
        let view = e.hash_view().unwrap();
        let layout: Vec<Vec<String>> = view
            .buckets
            .iter()
            .map(|bucket| bucket.iter().map(|entry| entry.key.clone()).collect())
            .collect();
        let detected = e.validate("قول", "مقول").unwrap().scheme;
        (layout, view.capacity, detected)
    };
    assert_eq!(capacity, 32);
    assert!(detected.is_some());

    let state = AppState::new(config).unwrap();
    let view = state.engine.hash_view().unwrap();
    assert_eq!(view.capacity, capacity);
    let reloaded: Vec<Vec<String>> = view
        .buckets
        .iter()
        .map(|bucket| bucket.iter().map(|entry| entry.key.clone()).collect())
        .collect();
    assert_eq!(reloaded, layout);
    assert_eq!(state.engine.validate("قول", "مقول").unwrap().scheme, detected);
}
