use alloc::collections::VecDeque;
use core::time::Duration;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// What a renderer should currently be animating: nothing (`Idle`, input
/// accepted), the slide itself, or a landing effect (hole or portal).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Sliding,
    ResolvingTile,
}

impl Phase {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

/// A player's live position plus the immutable spawn cell used for hole
/// resets.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub position: Coord2,
    pub spawn: Coord2,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub players: SmallVec<[PlayerState; 2]>,
    pub current: PlayerId,
    pub winner: Option<PlayerId>,
}

/// What a transition animates, so a renderer can pick an effect without
/// re-deriving it from tiles.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StepKind {
    Slide,
    EffectPause,
    HoleReset,
    PortalTeleport,
    Complete,
}

/// One timed sub-step of a move: the state to render and how long to hold it
/// before requesting the next sub-step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: StepKind,
    pub snapshot: Snapshot,
    pub hold: Duration,
}

/// Result of submitting a direction.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveOutcome {
    /// Input arrived outside `Idle` or after a win; dropped without effect.
    Ignored,
    /// The slide resolved. The remaining sub-steps come from
    /// [`TurnEngine::advance`].
    Accepted(Transition),
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum PendingStep {
    EffectPause,
    Relocate { kind: StepKind, to: Coord2 },
    Complete { winner: Option<PlayerId> },
}

/// Owns the whole game state and is its sole mutator.
///
/// One move is one slide plus an optional landing effect, delivered as
/// strictly ordered timed [`Transition`]s: the slide from
/// [`Self::submit_move`], the rest from [`Self::advance`], one per call. The
/// phase stays away from `Idle` until the sequence is drained, which is what
/// drops stray input instead of queueing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnEngine {
    board: Board,
    players: SmallVec<[PlayerState; 2]>,
    current: usize,
    phase: Phase,
    winner: Option<PlayerId>,
    pending: VecDeque<PendingStep>,
    timings: Timings,
}

impl TurnEngine {
    pub fn new(board: Board) -> Self {
        Self::with_timings(board, Timings::default())
    }

    pub fn with_timings(board: Board, timings: Timings) -> Self {
        let players = Self::roster(&board);
        Self {
            board,
            players,
            current: 0,
            phase: Default::default(),
            winner: None,
            pending: VecDeque::new(),
            timings,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn current_player(&self) -> PlayerId {
        self.players[self.current].id
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn position_of(&self, id: PlayerId) -> Option<Coord2> {
        self.players
            .iter()
            .find(|player| player.id == id)
            .map(|player| player.position)
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// True while the engine will act on a submitted direction: phase `Idle`
    /// and no winner declared.
    pub fn accepts_input(&self) -> bool {
        self.phase.is_idle() && self.winner.is_none()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            players: self.players.clone(),
            current: self.current_player(),
            winner: self.winner,
        }
    }

    /// Resolves a slide for the current player. Outside `Idle`, or once a
    /// winner is declared, the input is discarded and `Ignored` comes back;
    /// otherwise the slide sub-step is returned and the caller drains the
    /// rest via [`Self::advance`].
    pub fn submit_move(&mut self, direction: Direction) -> MoveOutcome {
        if !self.accepts_input() {
            log::trace!("{} ignored (phase {:?})", direction, self.phase);
            return MoveOutcome::Ignored;
        }

        let from = self.players[self.current].position;
        let target = self.resolve_slide(from, direction);
        self.plan_landing(target);

        self.players[self.current].position = target;
        self.phase = Phase::Sliding;
        log::debug!(
            "{} slides {} from {:?} to {:?}",
            self.players[self.current].id,
            direction,
            from,
            target
        );

        MoveOutcome::Accepted(self.transition(StepKind::Slide, self.timings.slide))
    }

    /// Applies the next queued sub-step and returns it, or `None` once the
    /// move is fully resolved and the phase is back to `Idle`.
    pub fn advance(&mut self) -> Option<Transition> {
        use PendingStep::*;

        Some(match self.pending.pop_front()? {
            EffectPause => {
                self.phase = Phase::ResolvingTile;
                self.transition(StepKind::EffectPause, self.timings.effect_pause)
            }
            Relocate { kind, to } => {
                self.players[self.current].position = to;
                self.transition(kind, self.timings.settle)
            }
            Complete { winner } => {
                match winner {
                    Some(id) => {
                        self.winner = Some(id);
                        log::debug!("{} wins", id);
                    }
                    None => self.current = (self.current + 1) % self.players.len(),
                }
                self.phase = Phase::Idle;
                self.transition(StepKind::Complete, Duration::ZERO)
            }
        })
    }

    /// Resets to the initial snapshot: players at their spawns, player 1 to
    /// move, no winner, nothing pending. Valid in any phase.
    pub fn restart(&mut self) {
        self.players = Self::roster(&self.board);
        self.current = 0;
        self.phase = Phase::Idle;
        self.winner = None;
        self.pending.clear();
        log::debug!("game reset");
    }

    fn roster(board: &Board) -> SmallVec<[PlayerState; 2]> {
        board
            .spawns()
            .iter()
            .enumerate()
            .map(|(index, &spawn)| PlayerState {
                id: PlayerId::new(index as u8 + 1),
                position: spawn,
                spawn,
            })
            .collect()
    }

    /// Walks from `from` along `direction` until a wall or the board edge
    /// stops the slide one cell short, or a special tile catches it.
    fn resolve_slide(&self, from: Coord2, direction: Direction) -> Coord2 {
        let mut last = from;

        loop {
            let Some(ahead) = self.board.neighbor(last, direction) else {
                return last;
            };

            let tile = self.board[ahead];
            if tile.is_wall() {
                return last;
            }
            if tile.catches_slider() {
                return ahead;
            }
            last = ahead;
        }
    }

    /// Queues the sub-steps that follow the slide, keyed on the landing
    /// tile. A zero-distance slide lands on the mover's own cell, so a
    /// portal entrance under its feet fires again.
    fn plan_landing(&mut self, target: Coord2) {
        use PendingStep::*;

        let mover = self.players[self.current];

        match self.board[target] {
            Tile::Target => self.pending.push_back(Complete {
                winner: Some(mover.id),
            }),
            Tile::Hole => {
                self.pending.push_back(EffectPause);
                self.pending.push_back(Relocate {
                    kind: StepKind::HoleReset,
                    to: mover.spawn,
                });
                self.pending.push_back(Complete { winner: None });
            }
            Tile::Portal(_) => {
                let exit = self
                    .board
                    .portal_partner(target)
                    .expect("portal entrances should be paired");
                self.pending.push_back(EffectPause);
                self.pending.push_back(Relocate {
                    kind: StepKind::PortalTeleport,
                    to: exit,
                });
                self.pending.push_back(Complete { winner: None });
            }
            _ => self.pending.push_back(Complete { winner: None }),
        }
    }

    fn transition(&self, kind: StepKind, hold: Duration) -> Transition {
        Transition {
            kind,
            snapshot: self.snapshot(),
            hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    const P1: PlayerId = PlayerId::new(1);
    const P2: PlayerId = PlayerId::new(2);

    fn rink(text: &str) -> Board {
        layout::parse(text).unwrap()
    }

    fn engine(text: &str) -> TurnEngine {
        TurnEngine::new(rink(text))
    }

    fn drain(engine: &mut TurnEngine) -> Vec<Transition> {
        let mut steps = Vec::new();
        while let Some(step) = engine.advance() {
            steps.push(step);
        }
        steps
    }

    fn kinds(steps: &[Transition]) -> Vec<StepKind> {
        steps.iter().map(|step| step.kind).collect()
    }

    #[test]
    fn slide_stops_before_wall() {
        let mut engine = engine("P1 E E W P2");

        let MoveOutcome::Accepted(slide) = engine.submit_move(Direction::Right) else {
            panic!("move should be accepted");
        };

        assert_eq!(slide.kind, StepKind::Slide);
        assert_eq!(slide.hold, Duration::from_millis(300));
        assert_eq!(slide.snapshot.phase, Phase::Sliding);
        assert_eq!(slide.snapshot.players[0].position, (0, 2));

        let steps = drain(&mut engine);
        assert_eq!(kinds(&steps), [StepKind::Complete]);
        assert_eq!(steps[0].hold, Duration::ZERO);
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.current_player(), P2);
    }

    #[test]
    fn slide_runs_to_the_board_edge() {
        let mut engine = engine("P1 E E E P2");

        let outcome = engine.submit_move(Direction::Right);
        assert!(outcome.is_accepted());
        drain(&mut engine);

        // the mover stops on the edge cell, which both players now share
        assert_eq!(engine.position_of(P1), Some((0, 4)));
        assert_eq!(engine.position_of(P2), Some((0, 4)));
    }

    #[test]
    fn blocked_slide_still_advances_turn() {
        let mut engine = engine("P1 W P2");

        let MoveOutcome::Accepted(slide) = engine.submit_move(Direction::Right) else {
            panic!("move should be accepted");
        };

        assert_eq!(slide.snapshot.players[0].position, (0, 0));
        assert_eq!(slide.hold, Duration::from_millis(300));

        let steps = drain(&mut engine);
        assert_eq!(kinds(&steps), [StepKind::Complete]);
        assert_eq!(engine.position_of(P1), Some((0, 0)));
        assert_eq!(engine.current_player(), P2);
    }

    #[test]
    fn landing_on_target_wins_without_passing_the_turn() {
        let mut engine = engine("P1 E T P2");

        engine.submit_move(Direction::Right);
        let steps = drain(&mut engine);

        assert_eq!(kinds(&steps), [StepKind::Complete]);
        assert_eq!(steps[0].snapshot.winner, Some(P1));
        assert_eq!(engine.winner(), Some(P1));
        assert_eq!(engine.current_player(), P1);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(!engine.accepts_input());
    }

    #[test]
    fn input_after_win_is_dropped() {
        let mut engine = engine("P1 E T P2");

        engine.submit_move(Direction::Right);
        drain(&mut engine);

        assert_eq!(engine.submit_move(Direction::Left), MoveOutcome::Ignored);
        assert_eq!(engine.position_of(P1), Some((0, 2)));
        assert_eq!(engine.position_of(P2), Some((0, 3)));
        assert_eq!(engine.advance(), None);
    }

    #[test]
    fn hole_resets_mover_to_spawn() {
        let mut engine = engine("P1 E H P2");

        let MoveOutcome::Accepted(slide) = engine.submit_move(Direction::Right) else {
            panic!("move should be accepted");
        };
        assert_eq!(slide.snapshot.players[0].position, (0, 2));

        let steps = drain(&mut engine);
        assert_eq!(
            kinds(&steps),
            [StepKind::EffectPause, StepKind::HoleReset, StepKind::Complete]
        );
        assert_eq!(steps[0].snapshot.phase, Phase::ResolvingTile);
        assert_eq!(steps[0].hold, Duration::from_millis(400));
        assert_eq!(steps[1].snapshot.players[0].position, (0, 0));
        assert_eq!(steps[1].hold, Duration::from_millis(300));

        assert_eq!(engine.position_of(P1), Some((0, 0)));
        assert_eq!(engine.current_player(), P2);
    }

    #[test]
    fn portal_teleports_to_partner_entrance() {
        let mut engine = engine(
            "P1 E O1 P2
             E  E E  E
             E  E O1 E",
        );

        engine.submit_move(Direction::Right);
        let steps = drain(&mut engine);

        assert_eq!(
            kinds(&steps),
            [
                StepKind::EffectPause,
                StepKind::PortalTeleport,
                StepKind::Complete
            ]
        );
        assert_eq!(steps[1].snapshot.players[0].position, (2, 2));
        assert_eq!(engine.position_of(P1), Some((2, 2)));
        assert_eq!(engine.current_player(), P2);
    }

    #[test]
    fn resting_on_a_portal_fires_it_again_on_a_blocked_slide() {
        let mut engine = engine(
            "P1 E O1 P2
             E  E E  E
             E  E O1 E",
        );

        engine.submit_move(Direction::Right);
        drain(&mut engine);
        assert_eq!(engine.position_of(P1), Some((2, 2)));

        engine.submit_move(Direction::Down);
        drain(&mut engine);
        assert_eq!(engine.position_of(P2), Some((2, 3)));

        // blocked slide, but the mover is standing on an entrance
        engine.submit_move(Direction::Down);
        let steps = drain(&mut engine);

        assert_eq!(
            kinds(&steps),
            [
                StepKind::EffectPause,
                StepKind::PortalTeleport,
                StepKind::Complete
            ]
        );
        assert_eq!(engine.position_of(P1), Some((0, 2)));
    }

    #[test]
    fn input_mid_sequence_is_dropped_without_state_change() {
        let mut engine = engine("P1 E H P2");

        engine.submit_move(Direction::Right);
        let before = engine.snapshot();

        assert_eq!(engine.submit_move(Direction::Left), MoveOutcome::Ignored);
        assert_eq!(engine.snapshot(), before);

        engine.advance();
        assert_eq!(engine.phase(), Phase::ResolvingTile);
        assert_eq!(engine.submit_move(Direction::Up), MoveOutcome::Ignored);

        drain(&mut engine);
        assert!(engine.accepts_input());
        assert!(engine.submit_move(Direction::Left).is_accepted());
    }

    #[test]
    fn advance_with_nothing_pending_returns_none() {
        let mut engine = engine("P1 E E W P2");

        assert_eq!(engine.advance(), None);

        engine.submit_move(Direction::Right);
        drain(&mut engine);
        assert_eq!(engine.advance(), None);
    }

    #[test]
    fn restart_restores_the_initial_snapshot() {
        let mut engine = engine("P1 E H P2");
        let initial = engine.snapshot();

        engine.submit_move(Direction::Right);
        engine.advance();
        assert_eq!(engine.phase(), Phase::ResolvingTile);

        engine.restart();

        assert_eq!(engine.snapshot(), initial);
        assert_eq!(engine.advance(), None);
        assert!(engine.accepts_input());
    }

    #[test]
    fn restart_after_win_reopens_input() {
        let mut engine = engine("P1 E T P2");
        let initial = engine.snapshot();

        engine.submit_move(Direction::Right);
        drain(&mut engine);
        assert_eq!(engine.winner(), Some(P1));

        engine.restart();

        assert_eq!(engine.snapshot(), initial);
        assert_eq!(engine.winner(), None);
        assert!(engine.submit_move(Direction::Right).is_accepted());
    }

    #[test]
    fn turn_alternates_between_players() {
        let mut engine = engine(
            "P1 E E
             E  E E
             P2 E E",
        );

        assert_eq!(engine.current_player(), P1);

        engine.submit_move(Direction::Right);
        drain(&mut engine);
        assert_eq!(engine.current_player(), P2);

        engine.submit_move(Direction::Right);
        drain(&mut engine);
        assert_eq!(engine.current_player(), P1);

        assert_eq!(engine.position_of(P1), Some((0, 2)));
        assert_eq!(engine.position_of(P2), Some((2, 2)));
    }

    #[test]
    fn every_direction_resolves_to_a_walkable_cell() {
        let text = "E E  H E  E
                    E E  E E  E
                    T E  P1 E O1
                    E E  E E  E
                    E O1 E P2 E";

        for direction in Direction::ALL {
            let mut engine = engine(text);

            let MoveOutcome::Accepted(slide) = engine.submit_move(direction) else {
                panic!("move should be accepted");
            };
            let target = slide.snapshot.players[0].position;

            assert!(engine.board().in_bounds(target));
            assert!(!engine.board().is_wall(target));

            drain(&mut engine);
            assert_eq!(engine.phase(), Phase::Idle);
        }
    }

    #[test]
    fn classic_rink_opening_slide_stops_before_the_first_wall() {
        let mut engine = TurnEngine::new(layout::classic());
        assert_eq!(engine.position_of(P1), Some((0, 0)));

        let MoveOutcome::Accepted(slide) = engine.submit_move(Direction::Right) else {
            panic!("move should be accepted");
        };

        assert_eq!(slide.snapshot.players[0].position, (0, 3));
        drain(&mut engine);
        assert_eq!(engine.current_player(), P2);
    }

    #[test]
    fn classic_rink_hole_sends_the_mover_home() {
        let mut engine = TurnEngine::new(layout::classic());

        // player 1 opens, player 2 slides down the right edge to (3, 9)
        engine.submit_move(Direction::Right);
        drain(&mut engine);
        engine.submit_move(Direction::Down);
        drain(&mut engine);
        assert_eq!(engine.position_of(P2), Some((3, 9)));

        // player 1 is already against the wall at (0, 4)
        engine.submit_move(Direction::Right);
        drain(&mut engine);

        // player 2 slides left into the hole at (3, 8)
        let MoveOutcome::Accepted(slide) = engine.submit_move(Direction::Left) else {
            panic!("move should be accepted");
        };
        assert_eq!(slide.snapshot.players[1].position, (3, 8));

        let steps = drain(&mut engine);
        assert_eq!(
            kinds(&steps),
            [StepKind::EffectPause, StepKind::HoleReset, StepKind::Complete]
        );
        assert_eq!(engine.position_of(P2), Some((0, 9)));
        assert_eq!(engine.current_player(), P1);
    }

    #[test]
    fn custom_timings_flow_into_transitions() {
        let timings = Timings {
            slide: Duration::from_millis(50),
            effect_pause: Duration::from_millis(70),
            settle: Duration::from_millis(90),
        };
        let mut engine = TurnEngine::with_timings(rink("P1 E H P2"), timings);

        let MoveOutcome::Accepted(slide) = engine.submit_move(Direction::Right) else {
            panic!("move should be accepted");
        };
        assert_eq!(slide.hold, Duration::from_millis(50));

        let steps = drain(&mut engine);
        assert_eq!(steps[0].hold, Duration::from_millis(70));
        assert_eq!(steps[1].hold, Duration::from_millis(90));
        assert_eq!(steps[2].hold, Duration::ZERO);
    }

    #[test]
    fn serialized_engine_resumes_mid_sequence() {
        let mut engine = engine(
            "P1 E O1 P2
             E  E E  E
             E  E O1 E",
        );
        engine.submit_move(Direction::Right);

        let json = serde_json::to_string(&engine).unwrap();
        let mut resumed: TurnEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(resumed, engine);

        loop {
            let step = engine.advance();
            assert_eq!(resumed.advance(), step);
            if step.is_none() {
                break;
            }
        }

        assert_eq!(resumed, engine);
        assert_eq!(resumed.position_of(P1), Some((2, 2)));
    }
}
