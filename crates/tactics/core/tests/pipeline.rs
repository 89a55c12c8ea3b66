use tactics_core::{
    Ability, ActionSpec, ConcentrationLink, EngineConfig, EngineState, ExecutionEnv,
    ExecutionResult, FixedDice, HookSpec, LogEntry, OpStatus, Operation, OutcomeKind, Position,
    ReactionContext, ReactionSignal, ReactionWindow, ReactionWindows, ResolutionSpec, SkipReason,
    StatusEntry, TacticsEngine, TargetSelector, TargetingMode, TargetingRule, Token, TokenId,
};

const HERO: TokenId = TokenId(0);
const ORC: TokenId = TokenId(1);
const WOLF: TokenId = TokenId(2);
const BAT: TokenId = TokenId(3);
const SQUIRE: TokenId = TokenId(4);

fn battle() -> EngineState {
    EngineState::new(
        Token::new(HERO, "hero", Position::ORIGIN, 30)
            .with_mod(Ability::For, 3)
            .with_mod(Ability::Sag, 1)
            .with_level(1),
    )
    .with_enemy(
        Token::new(ORC, "orc", Position::new(1, 0), 15)
            .with_armor_class(13)
            .with_mod(Ability::For, 3)
            .with_mod(Ability::Con, 2),
    )
    .with_enemy(Token::new(WOLF, "wolf", Position::new(2, 0), 11).with_armor_class(12))
    .with_enemy(Token::new(BAT, "bat", Position::new(0, 3), 1))
    .with_ally(Token::new(SQUIRE, "squire", Position::new(0, 1), 10))
}

fn run(state: &EngineState, spec: &ActionSpec, target: Option<TokenId>, face: u32) -> ExecutionResult {
    let config = EngineConfig::default();
    let mut dice = FixedDice(face);
    TacticsEngine::new(state, &config)
        .run(spec, HERO, target, &mut ExecutionEnv::new(&mut dice))
        .expect("action compiles")
}

fn hp(result: &ExecutionResult, id: TokenId) -> u32 {
    result.state.token(id).map_or(0, |t| t.hp)
}

#[test]
fn unresolved_target_only_touches_the_log() {
    let state = battle();
    let spec = ActionSpec {
        on_hit: vec![
            Operation::damage("2d6"),
            Operation::apply_condition("prone", Some(1)),
        ],
        ..ActionSpec::new("swing").with_targeting(TargetingRule::new(TargetingMode::None, 0))
    };

    let result = run(&state, &spec, None, 6);
    assert!(result.ok);
    assert_eq!(result.state.tokens, state.tokens);
    assert_eq!(result.state.effects, state.effects);
    assert!(result.reports.iter().all(|r| r.status == OpStatus::Skipped(SkipReason::UnresolvedTarget)));
    assert_eq!(result.reports.len(), 2);
}

#[test]
fn formula_damage_uses_actor_modifier() {
    let spec = ActionSpec {
        on_hit: vec![Operation::damage("1d6 + modFOR")],
        ..ActionSpec::new("club")
    };
    let result = run(&battle(), &spec, Some(ORC), 4);
    assert_eq!(result.reports[0].amount, Some(7));
    assert_eq!(hp(&result, ORC), 8);

    let spec = ActionSpec {
        on_hit: vec![Operation::damage("1d6 + modFOR")],
        ..ActionSpec::new("club")
    };
    let result = run(&battle(), &spec, Some(BAT), 4);
    assert_eq!(hp(&result, BAT), 0);
}

#[test]
fn crit_applies_hit_and_crit_operations() {
    let spec = ActionSpec {
        on_hit: vec![Operation::damage("3")],
        on_crit: vec![Operation::apply_condition("bleeding", Some(2))],
        ..ActionSpec::new("rapier").with_resolution(ResolutionSpec::attack(Ability::For))
    };
    let result = run(&battle(), &spec, Some(ORC), 20);

    assert_eq!(result.outcome.as_ref().map(|o| o.kind), Some(OutcomeKind::Crit));
    let orc = result.state.token(ORC).unwrap();
    assert_eq!(orc.hp, 12);
    assert!(orc.statuses.has("bleeding"));
}

#[test]
fn attack_without_armor_class_always_hits() {
    let spec = ActionSpec {
        on_hit: vec![Operation::damage("1")],
        ..ActionSpec::new("swat").with_resolution(ResolutionSpec::attack(Ability::For))
    };
    let mut state = battle();
    state.token_mut(BAT).unwrap().hp = 5;
    let result = run(&state, &spec, Some(BAT), 1);
    assert_eq!(result.outcome.as_ref().map(|o| o.kind), Some(OutcomeKind::Hit));
    assert_eq!(hp(&result, BAT), 4);
}

#[test]
fn new_concentration_purges_the_previous_source() {
    let mut state = battle();
    let bless = ConcentrationLink {
        source_id: "bless@0".into(),
        owner: HERO,
        action_id: "bless".into(),
    };
    state.token_mut(HERO).unwrap().concentration = Some(bless.clone());
    state.concentration = Some(bless);
    state
        .token_mut(SQUIRE)
        .unwrap()
        .statuses
        .apply(StatusEntry::new("blessed", Some(10)).with_concentration("bless@0"));

    let spec = ActionSpec {
        on_hit: vec![
            Operation::StartConcentration { source: None },
            Operation::apply_condition("hexed", None),
        ],
        ..ActionSpec::new("hex")
    };
    let result = run(&state, &spec, Some(ORC), 10);

    assert!(!result.state.token(SQUIRE).unwrap().statuses.has("blessed"));
    let hexed = result.state.token(ORC).unwrap().statuses.get("hexed").unwrap();
    assert_eq!(hexed.concentration_source.as_deref(), Some("hex@0"));
    assert_eq!(
        result.state.concentration.as_ref().map(|l| l.source_id.as_str()),
        Some("hex@0")
    );
}

#[test]
fn expansion_stops_at_max_targets_and_lock_freezes_selection() {
    let expand = Operation::ExpandTargets {
        radius: None,
        hostile_only: true,
    };
    let spec = ActionSpec {
        on_hit: vec![Operation::damage("2")],
        ..ActionSpec::new("sweep")
            .with_targeting(TargetingRule::new(TargetingMode::Multi, 2))
            .with_hook(HookSpec::new("onTargeting", vec![expand.clone()]))
            .with_hook(HookSpec::new("beforeResolve", vec![expand, Operation::Retarget { token: BAT }]))
    };
    let result = run(&battle(), &spec, Some(ORC), 10);

    assert_eq!(result.state.targeting.selected, vec![ORC, WOLF]);
    let targets: Vec<_> = result.outcomes.iter().map(|o| o.target).collect();
    assert_eq!(targets, vec![Some(ORC), Some(WOLF)]);
    assert_eq!(hp(&result, BAT), 1);

    let locked = result
        .reports
        .iter()
        .filter(|r| r.status == OpStatus::Skipped(SkipReason::TargetingLocked))
        .count();
    assert_eq!(locked, 2);
}

#[test]
fn contested_tie_goes_to_the_actor() {
    let spec = ActionSpec::new("shove")
        .with_resolution(ResolutionSpec::contested(Ability::For, Ability::For));
    let result = run(&battle(), &spec, Some(ORC), 10);
    let outcome = result.outcome.unwrap();
    assert_eq!(outcome.kind, OutcomeKind::ContestedWin);
    let rolls = outcome.contested.unwrap();
    assert_eq!(rolls.actor_total, rolls.target_total);
}

#[test]
fn prone_can_be_applied_and_removed() {
    let spec = ActionSpec {
        on_hit: vec![
            Operation::apply_condition("prone", Some(1)),
            Operation::remove_condition("prone"),
        ],
        ..ActionSpec::new("trip")
    };
    let result = run(&battle(), &spec, Some(ORC), 10);
    assert!(result.state.token(ORC).unwrap().statuses.get("prone").is_none());
}

#[test]
fn failed_save_runs_the_failure_branch() {
    let spec = ActionSpec {
        on_save_fail: vec![Operation::apply_condition("poisoned", Some(1))],
        on_save_success: vec![Operation::Log {
            message: "shrugged off".into(),
        }],
        ..ActionSpec::new("venom").with_resolution(ResolutionSpec::saving_throw(Ability::Con, "15"))
    };
    let result = run(&battle(), &spec, Some(ORC), 10);

    let outcome = result.outcome.as_ref().unwrap();
    assert_eq!((outcome.kind, outcome.total), (OutcomeKind::SaveFail, 12));
    assert!(result.state.token(ORC).unwrap().statuses.has("poisoned"));
    assert!(!result.logs.iter().any(|e| matches!(e, LogEntry::Message(_))));
}

#[test]
fn pre_window_interrupt_keeps_caller_state() {
    let state = battle();
    let spec = ActionSpec {
        on_hit: vec![Operation::damage("8")],
        reactions: ReactionWindows {
            pre: true,
            post: true,
        },
        ..ActionSpec::new("fireball")
    };
    let config = EngineConfig::default();
    let mut dice = FixedDice(3);
    let mut windows = Vec::new();
    let mut counterspell = |window: ReactionWindow, ctx: &ReactionContext<'_>| {
        windows.push((window, ctx.target));
        ReactionSignal::Interrupt
    };
    let mut env = ExecutionEnv::new(&mut dice).with_reactions(&mut counterspell);

    let result = TacticsEngine::new(&state, &config)
        .run(&spec, HERO, Some(ORC), &mut env)
        .unwrap();
    drop(env);

    assert!(!result.ok);
    assert!(result.interrupted);
    assert_eq!(result.state, state);
    assert!(result.reports.is_empty());
    assert_eq!(windows, vec![(ReactionWindow::Pre, Some(ORC))]);
}

#[test]
fn post_window_interrupt_discards_applied_work() {
    let state = battle();
    let spec = ActionSpec {
        on_hit: vec![Operation::damage("8")],
        reactions: ReactionWindows {
            pre: false,
            post: true,
        },
        ..ActionSpec::new("fireball")
    };
    let config = EngineConfig::default();
    let mut dice = FixedDice(3);
    let mut shield = |window: ReactionWindow, ctx: &ReactionContext<'_>| match window {
        ReactionWindow::Post if ctx.outcome.is_some() => ReactionSignal::Interrupt,
        _ => ReactionSignal::Continue,
    };
    let mut env = ExecutionEnv::new(&mut dice).with_reactions(&mut shield);

    let result = TacticsEngine::new(&state, &config)
        .run(&spec, HERO, Some(ORC), &mut env)
        .unwrap();
    assert!(result.interrupted);
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.state.token(ORC).unwrap().hp, 15);
}

#[test]
fn self_targeting_heals_the_actor() {
    let mut state = battle();
    state.token_mut(HERO).unwrap().hp = 10;
    let spec = ActionSpec {
        on_hit: vec![Operation::Heal {
            target: TargetSelector::Primary,
            formula: "1d8 + modSAG".into(),
        }],
        ..ActionSpec::new("second-wind").with_targeting(TargetingRule::new(TargetingMode::SelfOnly, 1))
    };
    let result = run(&state, &spec, None, 5);
    assert_eq!(hp(&result, HERO), 16);
}

#[cfg(feature = "serde")]
#[test]
fn authored_json_action_runs() {
    let json = r#"{
        "id": "shield-bash",
        "name": "Shield Bash",
        "resolution": { "kind": "ATTACK_ROLL", "ability": "FOR" },
        "onHit": [
            { "op": "deal_damage", "formula": "1d4 + modFOR" },
            { "op": "push", "distance": 1 }
        ],
        "hooks": [
            {
                "phase": "afterEffects",
                "conditions": [{ "type": "has_status", "subject": "target", "status": "prone" }],
                "operations": [{ "op": "deal_damage", "formula": "2" }]
            }
        ],
        "tags": ["melee"]
    }"#;
    let spec: ActionSpec = serde_json::from_str(json).expect("valid action json");
    assert_eq!(spec.on_hit.len(), 2);
    assert_eq!(spec.hooks[0].phase, "afterEffects");

    let result = run(&battle(), &spec, Some(ORC), 15);
    assert!(result.ok);
    assert_eq!(hp(&result, ORC), 15 - 7);
    assert!(result.logs.iter().any(|e| matches!(e, LogEntry::Outcome(o) if o.kind == OutcomeKind::Hit)));
}
