//! The eight-phase transition pipeline.
//!
//! Phase order for every transition attempt:
//!
//! 1. machine-wide after-each-state hooks
//! 2. `after` hooks of the pre-transition state
//! 3. machine-wide before-each-transition hooks
//! 4. `before` hooks of the transition
//!    — the current-state pointer swaps to the target here —
//! 5. `after` hooks of the transition
//! 6. machine-wide after-each-transition hooks
//! 7. `before` hooks of the post-transition state
//! 8. machine-wide before-each-state hooks
//!
//! Hooks within a phase run serially, in list order. The first hook that
//! resolves to `false` vetoes the attempt: in phases 1-4 the machine is
//! simply left in its original state; in phases 5-8 the pointer is rolled
//! back first, so a late veto is observably indistinguishable from an early
//! one. A hook failure after the swap (timeout) rolls back the same way.
//!
//! When a timeout is configured each hook races a timer; without one a hook
//! that never settles stalls the pipeline indefinitely, by design.

use super::{EachPhase, StateMachine};
use crate::core::hook::{Hook, HookContext};
use crate::error::StateMachineError;
use serde_json::Value;
use std::sync::Arc;

impl StateMachine {
    pub(crate) async fn run_pipeline(
        &self,
        edge_index: usize,
        target_index: usize,
        args: Arc<[Value]>,
    ) -> Result<(), StateMachineError> {
        let graph = self.inner_graph();
        let edge = &graph.transitions[edge_index];
        let from_index = self.current_index();

        let ctx = HookContext {
            transition: edge.name.clone(),
            from: graph.states[from_index].name.clone(),
            to: graph.states[target_index].name.clone(),
            transport: self.inner_transport().clone(),
            args,
        };

        // Phases 1-4 fire before the pointer changes; a veto here leaves the
        // machine untouched.
        let pre_swap = [
            ("after_each_state", self.each_hooks(EachPhase::AfterEachState)),
            ("after_state", graph.states[from_index].after.clone()),
            (
                "before_each_transition",
                self.each_hooks(EachPhase::BeforeEachTransition),
            ),
            ("before_transition", edge.before.clone()),
        ];
        for (phase, hooks) in &pre_swap {
            if !self.run_list(phase, hooks, &ctx).await? {
                return Ok(());
            }
        }

        // From here on "current" denotes the target state.
        self.set_current_index(target_index);

        match self.run_post_swap(edge_index, target_index, &ctx).await {
            Ok(true) => {
                tracing::debug!(
                    transition = %ctx.transition,
                    from = %ctx.from,
                    to = %ctx.to,
                    "transition committed"
                );
                Ok(())
            }
            Ok(false) => {
                self.set_current_index(from_index);
                tracing::debug!(
                    transition = %ctx.transition,
                    from = %ctx.from,
                    to = %ctx.to,
                    "transition vetoed after swap, state rolled back"
                );
                Ok(())
            }
            Err(error) => {
                self.set_current_index(from_index);
                Err(error)
            }
        }
    }

    /// Phases 5-8. Any veto or failure here obliges the caller to roll the
    /// pointer back.
    async fn run_post_swap(
        &self,
        edge_index: usize,
        target_index: usize,
        ctx: &HookContext,
    ) -> Result<bool, StateMachineError> {
        let graph = self.inner_graph();
        let edge = &graph.transitions[edge_index];

        let post_swap = [
            ("after_transition", edge.after.clone()),
            (
                "after_each_transition",
                self.each_hooks(EachPhase::AfterEachTransition),
            ),
            ("before_state", graph.states[target_index].before.clone()),
            (
                "before_each_state",
                self.each_hooks(EachPhase::BeforeEachState),
            ),
        ];
        for (phase, hooks) in &post_swap {
            if !self.run_list(phase, hooks, ctx).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run one phase's hooks serially, left to right. Returns `Ok(false)` on
    /// the first veto. With a configured timeout each hook races a timer and
    /// losing the race fails the operation with `Timeout`.
    async fn run_list(
        &self,
        phase: &str,
        hooks: &[Hook],
        ctx: &HookContext,
    ) -> Result<bool, StateMachineError> {
        for hook in hooks {
            let fut = hook(ctx.clone());
            let ok = match self.inner_config().timeout() {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(ok) => ok,
                    Err(_) => {
                        return Err(self.inner_config().report(StateMachineError::Timeout));
                    }
                },
                None => fut.await,
            };
            if !ok {
                tracing::trace!(phase, "hook vetoed transition");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::core::graph::{StateSpec, StatesSpec, TransitionSpec, TransitionsSpec};
    use crate::core::hook::{hook, observer, Hook};
    use crate::error::ErrorCode;
    use crate::machine::StateMachine;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn logging(log: &Log, label: &'static str) -> Hook {
        let log = Arc::clone(log);
        observer(move |_ctx| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(label);
            }
        })
    }

    fn vetoing() -> Hook {
        hook(|_ctx| async { false })
    }

    fn simple_machine() -> StateMachine {
        StateMachine::new(
            "SOLID",
            vec![
                StateSpec::new("SOLID", json!(-100)),
                StateSpec::new("LIQUID", json!(50)),
            ],
            vec![TransitionSpec::new("MELT", "SOLID", "LIQUID")],
            Config::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn runs_hooks_in_pipeline_order() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));

        let machine = StateMachine::new(
            "SOLID",
            StatesSpec::new(vec![
                StateSpec::new("SOLID", json!(-100)).after(logging(&log, "2: AS")),
                StateSpec::new("LIQUID", json!(50)).before(logging(&log, "7: BS")),
            ])
            .before(logging(&log, "8: BES"))
            .after(logging(&log, "1: AES")),
            TransitionsSpec::new(vec![TransitionSpec::new("MELT", "SOLID", "LIQUID")
                .before(logging(&log, "4: BT"))
                .after(logging(&log, "5: AT"))])
            .before(logging(&log, "3: BET"))
            .after(logging(&log, "6: AET")),
            Config::default(),
        )
        .unwrap();

        machine.do_transition("MELT").await.unwrap();

        assert_eq!(
            *log.lock(),
            [
                "1: AES", "2: AS", "3: BET", "4: BT", "5: AT", "6: AET", "7: BS", "8: BES"
            ]
        );
    }

    #[tokio::test]
    async fn hooks_in_one_phase_run_in_list_order() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let machine = simple_machine();
        machine.on_before_transition(vec![
            logging(&log, "first"),
            logging(&log, "second"),
            logging(&log, "third"),
        ]);

        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(*log.lock(), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn veto_before_the_swap_is_a_no_op() {
        let machine = simple_machine();
        machine.on_before_transition(vec![
            observer(|_ctx| async {}),
            hook(|_ctx| async { true }),
            vetoing(),
        ]);

        let result = machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(result.state(), "SOLID");
    }

    #[tokio::test]
    async fn veto_in_after_each_state_stops_the_pipeline_early() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let machine = simple_machine();
        machine.on_after_state(vetoing());
        machine.on_before_transition(logging(&log, "unreachable"));

        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(machine.state(), "SOLID");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn veto_after_the_swap_rolls_the_state_back() {
        let machine = simple_machine();
        machine.on_after_transition(vetoing());

        let result = machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(result.state(), "SOLID");
    }

    #[tokio::test]
    async fn veto_in_target_state_before_hook_rolls_back() {
        let machine = StateMachine::new(
            "SOLID",
            vec![
                StateSpec::new("SOLID", json!({})),
                StateSpec::new("LIQUID", json!({})).before(vec![
                    observer(|_ctx| async {}),
                    hook(|_ctx| async { true }),
                    vetoing(),
                ]),
            ],
            vec![TransitionSpec::new("MELT", "SOLID", "LIQUID")],
            Config::default(),
        )
        .unwrap();

        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(machine.state(), "SOLID");
    }

    #[tokio::test]
    async fn late_veto_sees_the_target_as_current_mid_pipeline() {
        let observed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let machine = simple_machine();
        {
            let observed = Arc::clone(&observed);
            let probe = machine.clone();
            machine.on_after_transition(hook(move |_ctx| {
                let observed = Arc::clone(&observed);
                let probe = probe.clone();
                async move {
                    observed.lock().push(probe.state());
                    false
                }
            }));
        }

        machine.transit_to("LIQUID").await.unwrap();
        // The pointer had swapped when the hook ran, then rolled back.
        assert_eq!(*observed.lock(), ["LIQUID"]);
        assert_eq!(machine.state(), "SOLID");
    }

    #[tokio::test]
    async fn hook_context_names_the_attempt() {
        let machine = simple_machine();
        let seen: Arc<Mutex<Vec<(String, String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            machine.on_before_transition(observer(move |ctx| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().push((ctx.transition, ctx.from, ctx.to));
                }
            }));
        }

        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(
            *seen.lock(),
            [(
                "MELT".to_string(),
                "SOLID".to_string(),
                "LIQUID".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn extra_args_reach_every_hook() {
        let machine = simple_machine();
        let seen: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            machine.on_after_transition(observer(move |ctx| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().extend(ctx.args.iter().cloned());
                }
            }));
        }

        machine
            .transit_to_with("LIQUID", vec![json!(7), json!("heat")])
            .await
            .unwrap();
        assert_eq!(*seen.lock(), [json!(7), json!("heat")]);
    }

    #[tokio::test]
    async fn transport_accumulates_across_runs() {
        let machine = StateMachine::new(
            "SOLID",
            vec![
                StateSpec::new("SOLID", json!(-100)),
                StateSpec::new("LIQUID", json!(50)),
            ],
            TransitionsSpec::new(vec![
                TransitionSpec::new("MELT", "SOLID", "LIQUID"),
                TransitionSpec::new("FREEZE", "LIQUID", "SOLID"),
            ])
            .after(hook(|ctx| async move {
                let entropy = ctx
                    .transport
                    .get("entropy")
                    .and_then(|v| v.as_i64())
                    .map_or(0, |v| v + 1);
                ctx.transport.insert("entropy", json!(entropy));
                true
            })),
            Config::default(),
        )
        .unwrap();

        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(machine.transport().get("entropy"), Some(json!(0)));
        machine.transit_to("SOLID").await.unwrap();
        assert_eq!(machine.transport().get("entropy"), Some(json!(1)));
        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(machine.transport().get("entropy"), Some(json!(2)));
    }

    #[tokio::test]
    async fn slow_hook_times_out_when_configured() {
        let machine = StateMachine::new(
            "SOLID",
            vec![
                StateSpec::new("SOLID", json!({})),
                StateSpec::new("LIQUID", json!({})),
            ],
            vec![TransitionSpec::new("MELT", "SOLID", "LIQUID")],
            Config::new().with_timeout(Duration::from_millis(20)),
        )
        .unwrap();
        machine.on_before_transition(hook(|_ctx| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            true
        }));

        let error = machine.transit_to("LIQUID").await.unwrap_err();
        assert_eq!(error.code(), ErrorCode::Timeout);
        assert_eq!(machine.state(), "SOLID");
        assert!(!machine.is_pending());
    }

    #[tokio::test]
    async fn timeout_after_the_swap_rolls_back_before_failing() {
        let machine = StateMachine::new(
            "SOLID",
            vec![
                StateSpec::new("SOLID", json!({})),
                StateSpec::new("LIQUID", json!({})),
            ],
            vec![
                TransitionSpec::new("MELT", "SOLID", "LIQUID").after(hook(|_ctx| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    true
                })),
            ],
            Config::new().with_timeout(Duration::from_millis(20)),
        )
        .unwrap();

        let error = machine.transit_to("LIQUID").await.unwrap_err();
        assert_eq!(error.code(), ErrorCode::Timeout);
        assert_eq!(machine.state(), "SOLID");
    }

    #[tokio::test]
    async fn fast_hooks_pass_under_a_timeout() {
        let machine = StateMachine::new(
            "SOLID",
            vec![
                StateSpec::new("SOLID", json!({})),
                StateSpec::new("LIQUID", json!({})),
            ],
            vec![TransitionSpec::new("MELT", "SOLID", "LIQUID")],
            Config::new().with_timeout(Duration::from_secs(1)),
        )
        .unwrap();
        machine.on_before_transition(hook(|_ctx| async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            true
        }));

        machine.transit_to("LIQUID").await.unwrap();
        assert_eq!(machine.state(), "LIQUID");
    }
}
