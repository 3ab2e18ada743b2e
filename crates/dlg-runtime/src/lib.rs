mod engine;

pub use engine::{
    DialogueEngine, DialogueEngineOptions, EmptyLocalization, Localization, VariableStore,
    WALK_GUARD,
};
