//! The Monte-Carlo tree search engine: UCT selection, expansion with
//! chance-sampled deals, heuristic playouts, back-propagation, and the two
//! parallel modes (independent root trees, shared tree with virtual loss).
//!
//! Nodes live in an arena indexed by `usize`. Statistics are atomics so
//! tree-parallel workers can update them without a global lock; the node
//! body (state, untried actions, children) sits behind a per-node mutex.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use pineapple_base::Card;

use crate::arrangement::RowId;
use crate::heuristic;
use crate::moves::{self, Action};
use crate::scoring;
use crate::solver::{Budget, Options, Parallelism, ValueModel};
use crate::state::{State, STREET_DEAL};
use crate::time::Clock;

/// Candidate-list width used inside playouts; narrower than the root list
/// because playout moves only need to be plausible, not exhaustive.
const PLAYOUT_WIDTH: usize = 12;

/// How many playouts a worker runs between deadline checks.
const DEADLINE_CHECK_INTERVAL: u32 = 64;

const ROOT: usize = 0;

/// Leaf value function: scores a terminal state, sampling an opponent
/// completion when the model asks for one. A plain function pointer is all
/// the polymorphism the two strategies need.
type ValueFn = fn(&State, &mut fastrand::Rng) -> f64;

/// Aggregated statistics for one root child after the search.
#[derive(Clone, Debug)]
pub(crate) struct ChildStat {
    pub action: Action,
    pub visits: u64,
    pub value_sum: f64,
    pub order: usize,
}

impl ChildStat {
    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }
}

/// What the engine hands back to the facade.
pub(crate) struct SearchOutcome {
    pub stats: Vec<ChildStat>,
    pub simulations: u64,
    pub dropped: u64,
    pub degraded: bool,
}

// ---------------------------------------------------------------------------
// Atomic f64, updated by a compare-exchange loop.

struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> AtomicF64 {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn fetch_add(&self, delta: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tree arena.

struct NodeBody {
    state: State,
    /// Untried actions, stored reversed so `pop` yields generator order.
    untried: Vec<Action>,
    children: Vec<usize>,
    next_order: usize,
    terminal_value: Option<f64>,
}

struct Node {
    action: Option<Action>,
    terminal: bool,
    order: usize,
    visits: AtomicU32,
    virtual_loss: AtomicU32,
    value_sum: AtomicF64,
    body: Mutex<NodeBody>,
}

impl Node {
    fn new(action: Option<Action>, state: State, actions: Vec<Action>, order: usize) -> Node {
        let terminal = state.is_terminal();
        let mut untried = actions;
        untried.reverse();
        Node {
            action,
            terminal,
            order,
            visits: AtomicU32::new(0),
            virtual_loss: AtomicU32::new(0),
            value_sum: AtomicF64::new(0.0),
            body: Mutex::new(NodeBody {
                state,
                untried: if terminal { Vec::new() } else { untried },
                children: Vec::new(),
                next_order: 0,
                terminal_value: None,
            }),
        }
    }
}

struct Tree {
    nodes: RwLock<Vec<Node>>,
    free: Mutex<Vec<usize>>,
}

impl Tree {
    fn new(root_state: State, root_actions: Vec<Action>) -> Tree {
        Tree {
            nodes: RwLock::new(vec![Node::new(None, root_state, root_actions, 0)]),
            free: Mutex::new(Vec::new()),
        }
    }

    fn alloc(&self, node: Node) -> usize {
        let mut nodes = self.nodes.write();
        if let Some(slot) = self.free.lock().pop() {
            nodes[slot] = node;
            slot
        } else {
            nodes.push(node);
            nodes.len() - 1
        }
    }

    /// Reclaims the least-visited root subtree, never touching the indices
    /// in `protect`. Only called on worker-owned trees.
    fn prune_least_visited(&self, protect: &[usize]) -> bool {
        let nodes = self.nodes.read();
        let root_children = nodes[ROOT].body.lock().children.clone();
        let victim = root_children
            .iter()
            .copied()
            .filter(|idx| !protect.contains(idx))
            .min_by_key(|&idx| nodes[idx].visits.load(Ordering::Relaxed));
        let victim = match victim {
            Some(idx) if root_children.len() > 1 => idx,
            _ => return false,
        };

        let mut reclaimed = Vec::new();
        let mut stack = vec![victim];
        while let Some(idx) = stack.pop() {
            reclaimed.push(idx);
            stack.extend(nodes[idx].body.lock().children.iter().copied());
        }
        nodes[ROOT].body.lock().children.retain(|&c| c != victim);
        drop(nodes);

        self.free.lock().extend(reclaimed);
        true
    }
}

// ---------------------------------------------------------------------------
// Shared search context.

struct Ctx<'a> {
    options: &'a Options,
    clock: &'a dyn Clock,
    deadline: Option<Duration>,
    max_simulations: u64,
    cancel: Option<&'a AtomicBool>,
    stop: AtomicBool,
    simulations: AtomicU64,
    dropped: AtomicU64,
    memo: Option<Memo>,
    value: ValueFn,
}

impl<'a> Ctx<'a> {
    fn new(options: &'a Options, budget: &'a Budget, clock: &'a dyn Clock) -> Ctx<'a> {
        Ctx {
            options,
            clock,
            deadline: budget.time_limit.map(|limit| clock.now() + limit),
            max_simulations: budget.max_simulations.unwrap_or(u64::MAX),
            cancel: budget.cancellation.as_deref(),
            stop: AtomicBool::new(false),
            simulations: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            memo: options
                .transposition_memo
                .as_ref()
                .map(|cfg| Memo::new(cfg.capacity)),
            value: match options.value_model {
                ValueModel::Matchup => matchup_value,
                ValueModel::SelfEvaluation => self_value,
            },
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
            || self.cancel.map_or(false, |c| c.load(Ordering::Relaxed))
    }

    fn budget_allows(&self) -> bool {
        self.simulations.load(Ordering::Relaxed) < self.max_simulations
    }

    fn note_simulation(&self) {
        if self.simulations.fetch_add(1, Ordering::Relaxed) + 1 >= self.max_simulations {
            self.stop.store(true, Ordering::Relaxed);
        }
    }

    fn check_deadline(&self) {
        if let Some(deadline) = self.deadline {
            if self.clock.now() >= deadline {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }

    fn widening_allowance(&self, visits: u32) -> usize {
        match &self.options.progressive_widening {
            None => usize::MAX,
            Some(pw) => ((pw.k * (visits.max(1) as f64).powf(pw.alpha)).ceil() as usize).max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Leaf value functions.

/// Deals the opponent the cards they are missing, places them with the
/// greedy default policy, and scores the matchup.
fn matchup_value(state: &State, rng: &mut fastrand::Rng) -> f64 {
    let mut opponent = [Card::WILD_X; 13];
    let known: Vec<Card> = state.known_opponent().iter().collect();
    if known.len() > 13 {
        return scoring::self_score(state.arrangement());
    }
    opponent[..known.len()].copy_from_slice(&known);

    if !state
        .unseen()
        .sample_into(rng, &mut opponent[known.len()..])
    {
        // Not enough unseen cards to model an opponent; fall back to the
        // opponent-free value.
        return scoring::self_score(state.arrangement());
    }

    let opponent = heuristic::place_all_greedy(&mut opponent);
    scoring::matchup_score(state.arrangement(), &opponent)
}

fn self_value(state: &State, _rng: &mut fastrand::Rng) -> f64 {
    scoring::self_score(state.arrangement())
}

// ---------------------------------------------------------------------------
// Playout.

/// Plays the remaining streets with the epsilon-greedy default policy and
/// scores the completed hand. `None` means the playout had to be dropped.
fn playout(ctx: &Ctx, rng: &mut fastrand::Rng, start: &State) -> Option<f64> {
    let mut state = *start;
    let mut streets = 0;
    while !state.is_terminal() {
        if state.dealt().is_empty() && !state.draw(rng, STREET_DEAL) {
            return None;
        }
        let actions = moves::generate(&state, PLAYOUT_WIDTH);
        let action = match actions.first() {
            None | Some(Action::Fold) => return None,
            Some(&first) => {
                if actions.len() > 1 && rng.f64() < ctx.options.eps_greedy {
                    actions[rng.usize(1..actions.len())]
                } else {
                    first
                }
            }
        };
        state.apply(&action);

        streets += 1;
        if streets > 5 {
            return None;
        }
    }
    Some((ctx.value)(&state, rng))
}

// ---------------------------------------------------------------------------
// Transposition memo: a bounded value cache keyed by a canonical state
// hash, sharded to keep lock contention down. Eviction is oldest-first.

const MEMO_SHARDS: usize = 8;

struct MemoShard {
    map: HashMap<u64, (u32, f64)>,
    order: VecDeque<u64>,
    capacity: usize,
}

struct Memo {
    shards: Vec<Mutex<MemoShard>>,
}

impl Memo {
    fn new(capacity: usize) -> Memo {
        let per_shard = (capacity / MEMO_SHARDS).max(1);
        Memo {
            shards: (0..MEMO_SHARDS)
                .map(|_| {
                    Mutex::new(MemoShard {
                        map: HashMap::new(),
                        order: VecDeque::new(),
                        capacity: per_shard,
                    })
                })
                .collect(),
        }
    }

    fn get(&self, key: u64) -> Option<f64> {
        let shard = self.shards[(key as usize) % MEMO_SHARDS].lock();
        shard.map.get(&key).map(|(n, w)| w / *n as f64)
    }

    fn insert(&self, key: u64, value: f64) {
        let mut shard = self.shards[(key as usize) % MEMO_SHARDS].lock();
        if let Some(entry) = shard.map.get_mut(&key) {
            entry.0 += 1;
            entry.1 += value;
            return;
        }
        if shard.map.len() >= shard.capacity {
            if let Some(oldest) = shard.order.pop_front() {
                shard.map.remove(&oldest);
            }
        }
        shard.map.insert(key, (1, value));
        shard.order.push_back(key);
    }
}

fn canonical_hash(state: &State) -> u64 {
    let mut hasher = DefaultHasher::new();
    for id in RowId::ALL {
        let row: pineapple_base::CardSet =
            state.arrangement().row(id).cards().iter().copied().collect();
        row.bits().hash(&mut hasher);
    }
    state.unseen().bits().hash(&mut hasher);
    let mut dealt: Vec<usize> = state.dealt().iter().map(|c| c.idx()).collect();
    dealt.sort_unstable();
    dealt.hash(&mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// One search iteration: select, expand, simulate, back-propagate.

fn backpropagate(tree: &Tree, path: &[usize], value: f64, vloss: bool) {
    let nodes = tree.nodes.read();
    for &idx in path {
        nodes[idx].visits.fetch_add(1, Ordering::Relaxed);
        nodes[idx].value_sum.fetch_add(value);
        if vloss && idx != ROOT {
            nodes[idx].virtual_loss.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

fn undo_virtual_loss(tree: &Tree, path: &[usize]) {
    let nodes = tree.nodes.read();
    for &idx in &path[1..] {
        nodes[idx].virtual_loss.fetch_sub(1, Ordering::Relaxed);
    }
}

fn uct_select(
    nodes: &[Node],
    children: &[usize],
    parent_visits: u32,
    exploration: f64,
    v_loss: f64,
    vloss_enabled: bool,
) -> usize {
    // Visit every child once, in generator order, before applying UCT.
    let mut best = children[0];
    let mut best_score = f64::NEG_INFINITY;
    for &child in children {
        let node = &nodes[child];
        let vl = if vloss_enabled {
            node.virtual_loss.load(Ordering::Relaxed)
        } else {
            0
        };
        let n = node.visits.load(Ordering::Relaxed) + vl;
        if n == 0 {
            return child;
        }
        let w = node.value_sum.load() - v_loss * vl as f64;
        let score = w / n as f64
            + exploration * ((parent_visits.max(1) as f64).ln() / n as f64).sqrt();
        if score > best_score {
            best_score = score;
            best = child;
        }
    }
    best
}

/// Runs one selection-expansion-simulation-backpropagation pass. Returns
/// `true` when a playout (or cached value) contributed statistics.
fn run_iteration(
    tree: &Tree,
    ctx: &Ctx,
    rng: &mut fastrand::Rng,
    vloss_enabled: bool,
    owned: bool,
) -> bool {
    let mut path = vec![ROOT];

    loop {
        let current = *path.last().unwrap();

        // Terminal leaf: its value is fixed once computed.
        let terminal_value = {
            let nodes = tree.nodes.read();
            let node = &nodes[current];
            if node.terminal {
                let mut body = node.body.lock();
                let value = match body.terminal_value {
                    Some(v) => v,
                    None => {
                        let v = (ctx.value)(&body.state, rng);
                        body.terminal_value = Some(v);
                        v
                    }
                };
                Some(value)
            } else {
                None
            }
        };
        if let Some(value) = terminal_value {
            backpropagate(tree, &path, value, vloss_enabled);
            return true;
        }

        // Expansion.
        let expand = {
            let nodes = tree.nodes.read();
            let node = &nodes[current];
            let mut body = node.body.lock();
            let allowance = ctx.widening_allowance(node.visits.load(Ordering::Relaxed));
            if !body.untried.is_empty()
                && (body.children.len() < allowance || body.children.is_empty())
            {
                let live_nodes = nodes.len() - tree.free.lock().len();
                if live_nodes >= ctx.options.node_cap {
                    // At the cap: reclaim what we can, then play out from
                    // this leaf rather than growing the tree.
                    let state = body.state;
                    drop(body);
                    drop(nodes);
                    if owned {
                        tree.prune_least_visited(&path);
                    }
                    return match playout(ctx, rng, &state) {
                        Some(value) => {
                            backpropagate(tree, &path, value, vloss_enabled);
                            true
                        }
                        None => {
                            ctx.dropped.fetch_add(1, Ordering::Relaxed);
                            log::debug!("dropped playout at node cap");
                            if vloss_enabled {
                                undo_virtual_loss(tree, &path);
                            }
                            false
                        }
                    };
                }

                let action = body.untried.pop().unwrap();
                let order = body.next_order;
                body.next_order += 1;
                let mut child_state = body.state;
                drop(body);
                drop(nodes);

                child_state.apply(&action);
                if !child_state.is_terminal() && !child_state.draw(rng, STREET_DEAL) {
                    // Deck ran dry mid-tree; drop the playout but keep the
                    // child so the defect is visible in the counters.
                    ctx.dropped.fetch_add(1, Ordering::Relaxed);
                    log::debug!("dropped expansion: unseen set exhausted");
                    if vloss_enabled {
                        undo_virtual_loss(tree, &path);
                    }
                    return false;
                }
                let child_actions = if child_state.is_terminal() {
                    Vec::new()
                } else {
                    moves::generate(&child_state, ctx.options.opener_candidates)
                };
                let child =
                    Node::new(Some(action), child_state, child_actions, order);
                let child_idx = tree.alloc(child);
                {
                    let nodes = tree.nodes.read();
                    if vloss_enabled {
                        nodes[child_idx].virtual_loss.fetch_add(1, Ordering::Relaxed);
                    }
                    nodes[current].body.lock().children.push(child_idx);
                }
                path.push(child_idx);
                Some(child_state)
            } else if body.children.is_empty() {
                // No untried actions and no children: value the state as it
                // stands (complete states score exactly, stuck ones get the
                // heuristic).
                let state = body.state;
                drop(body);
                drop(nodes);
                let value = if state.is_terminal() {
                    (ctx.value)(&state, rng)
                } else {
                    heuristic::static_score(&state)
                };
                backpropagate(tree, &path, value, vloss_enabled);
                return true;
            } else {
                // Select.
                let parent_visits = node.visits.load(Ordering::Relaxed);
                let selected = uct_select(
                    &nodes,
                    &body.children,
                    parent_visits,
                    ctx.options.exploration_c,
                    ctx.options.virtual_loss,
                    vloss_enabled,
                );
                if vloss_enabled {
                    nodes[selected].virtual_loss.fetch_add(1, Ordering::Relaxed);
                }
                path.push(selected);
                None
            }
        };

        // Simulate from a freshly expanded child.
        if let Some(child_state) = expand {
            let value = if let Some(memo) = &ctx.memo {
                let key = canonical_hash(&child_state);
                match memo.get(key) {
                    Some(cached) => Some(cached),
                    None => {
                        let fresh = playout(ctx, rng, &child_state);
                        if let Some(v) = fresh {
                            memo.insert(key, v);
                        }
                        fresh
                    }
                }
            } else {
                playout(ctx, rng, &child_state)
            };

            return match value {
                Some(v) => {
                    backpropagate(tree, &path, v, vloss_enabled);
                    true
                }
                None => {
                    ctx.dropped.fetch_add(1, Ordering::Relaxed);
                    log::debug!("dropped playout from expanded leaf");
                    if vloss_enabled {
                        undo_virtual_loss(tree, &path);
                    }
                    false
                }
            };
        }
    }
}

fn worker_loop(tree: &Tree, ctx: &Ctx, rng: &mut fastrand::Rng, vloss: bool, owned: bool) {
    let mut local: u32 = 0;
    loop {
        if local % DEADLINE_CHECK_INTERVAL == 0 {
            ctx.check_deadline();
        }
        if ctx.stopped() || !ctx.budget_allows() {
            return;
        }
        local = local.wrapping_add(1);
        if run_iteration(tree, ctx, rng, vloss, owned) {
            ctx.note_simulation();
        }
    }
}

fn root_stats(tree: &Tree) -> Vec<ChildStat> {
    let nodes = tree.nodes.read();
    let children = nodes[ROOT].body.lock().children.clone();
    let mut stats: Vec<ChildStat> = children
        .iter()
        .map(|&idx| {
            let node = &nodes[idx];
            ChildStat {
                action: node.action.expect("root children always carry actions"),
                visits: node.visits.load(Ordering::Relaxed) as u64,
                value_sum: node.value_sum.load(),
                order: node.order,
            }
        })
        .collect();
    stats.sort_by_key(|s| s.order);
    stats
}

fn merge_stats(per_worker: Vec<Vec<ChildStat>>) -> Vec<ChildStat> {
    let mut merged: HashMap<Action, ChildStat> = HashMap::new();
    for stats in per_worker {
        for stat in stats {
            merged
                .entry(stat.action)
                .and_modify(|m| {
                    m.visits += stat.visits;
                    m.value_sum += stat.value_sum;
                    m.order = m.order.min(stat.order);
                })
                .or_insert(stat);
        }
    }
    let mut stats: Vec<ChildStat> = merged.into_values().collect();
    stats.sort_by_key(|s| s.order);
    stats
}

/// Derives a per-worker stream from the root seed so that runs are
/// reproducible for a fixed (seed, worker count).
fn worker_rng(seed: u64, worker: usize) -> fastrand::Rng {
    let mut z = seed
        .wrapping_add((worker as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    fastrand::Rng::with_seed(z ^ (z >> 31))
}

/// Runs the full search over the given root candidates and returns the
/// merged per-action statistics.
pub(crate) fn search(
    root_state: &State,
    root_actions: &[Action],
    options: &Options,
    budget: &Budget,
    clock: &dyn Clock,
) -> SearchOutcome {
    let ctx = Ctx::new(options, budget, clock);
    let threads = options.threads.max(1);

    let (stats, degraded) = if threads == 1 {
        (run_single(root_state, root_actions, &ctx, 0), false)
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => {
                let stats = match options.parallelism {
                    Parallelism::Root => pool.install(|| {
                        let per_worker: Vec<Vec<ChildStat>> = (0..threads)
                            .into_par_iter()
                            .map(|worker| run_single(root_state, root_actions, &ctx, worker))
                            .collect();
                        merge_stats(per_worker)
                    }),
                    Parallelism::Tree => {
                        let tree = Tree::new(*root_state, root_actions.to_vec());
                        pool.install(|| {
                            (0..threads).into_par_iter().for_each(|worker| {
                                let mut rng = worker_rng(options.rng_seed, worker);
                                worker_loop(&tree, &ctx, &mut rng, true, false);
                            });
                        });
                        root_stats(&tree)
                    }
                };
                (stats, false)
            }
            Err(err) => {
                // Thread creation failed; degrade to a single-threaded
                // root search and say so, rather than erroring out.
                log::warn!("worker pool unavailable ({}), degrading to one thread", err);
                (run_single(root_state, root_actions, &ctx, 0), true)
            }
        }
    };

    let dropped = ctx.dropped.load(Ordering::Relaxed);
    if dropped > 0 {
        log::debug!("{} defensive playout drops during search", dropped);
    }

    SearchOutcome {
        stats,
        simulations: ctx.simulations.load(Ordering::Relaxed),
        dropped,
        degraded,
    }
}

fn run_single(
    root_state: &State,
    root_actions: &[Action],
    ctx: &Ctx,
    worker: usize,
) -> Vec<ChildStat> {
    let tree = Tree::new(*root_state, root_actions.to_vec());
    let mut rng = worker_rng(ctx.options.rng_seed, worker);
    worker_loop(&tree, ctx, &mut rng, false, true);
    root_stats(&tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MonotonicClock;

    fn cards(s: &str) -> Vec<Card> {
        s.split(' ').map(|c| c.parse().unwrap()).collect()
    }

    fn opener_search(dealt: &str, sims: u64, options: &Options) -> SearchOutcome {
        let state = State::opener(&cards(dealt));
        let actions = moves::generate(&state, options.opener_candidates);
        let clock = MonotonicClock::new();
        search(
            &state,
            &actions,
            options,
            &Budget::simulations(sims),
            &clock,
        )
    }

    #[test]
    fn a_single_simulation_visits_the_first_candidate() {
        let options = Options::default();
        let outcome = opener_search("As Ks Qs Js Ts", 1, &options);
        assert_eq!(outcome.simulations, 1);

        let visited: Vec<&ChildStat> =
            outcome.stats.iter().filter(|s| s.visits > 0).collect();
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].order, 0, "first candidate in generator order");
    }

    #[test]
    fn simulation_budget_is_respected() {
        let options = Options::default();
        let outcome = opener_search("Ah Kd 7c 2s 9h", 200, &options);
        assert_eq!(outcome.simulations, 200);
        let total_visits: u64 = outcome.stats.iter().map(|s| s.visits).sum();
        assert!(total_visits <= 200);
        assert!(total_visits > 0);
    }

    #[test]
    fn identical_seeds_reproduce_the_search() {
        let options = Options::default();
        let a = opener_search("Ah Kd 7c 2s 9h", 300, &options);
        let b = opener_search("Ah Kd 7c 2s 9h", 300, &options);

        assert_eq!(a.stats.len(), b.stats.len());
        for (x, y) in a.stats.iter().zip(b.stats.iter()) {
            assert_eq!(x.action, y.action);
            assert_eq!(x.visits, y.visits);
            assert_eq!(x.value_sum.to_bits(), y.value_sum.to_bits());
        }
    }

    #[test]
    fn progressive_widening_narrows_early_branching() {
        let mut options = Options::default();
        options.progressive_widening = Some(crate::solver::ProgressiveWidening::default());
        let outcome = opener_search("Ah Kd 7c 2s 9h", 50, &options);

        let expanded = outcome.stats.len();
        // ceil(2 * 50^0.5) = 15 is the widest the root may get at 50 visits.
        assert!(expanded <= 15, "expanded {} root children", expanded);
    }

    #[test]
    fn transposition_memo_does_not_break_the_search() {
        let mut options = Options::default();
        options.transposition_memo = Some(crate::solver::TranspositionMemo { capacity: 1024 });
        let outcome = opener_search("Ah Kd 7c 2s 9h", 200, &options);
        assert_eq!(outcome.simulations, 200);
    }

    #[test]
    fn node_cap_keeps_searching_without_growing() {
        let mut options = Options::default();
        options.node_cap = 8;
        let outcome = opener_search("Ah Kd 7c 2s 9h", 300, &options);
        assert_eq!(outcome.simulations, 300);
    }

    #[test]
    fn tree_parallel_mode_completes_and_merges() {
        let mut options = Options::default();
        options.threads = 2;
        options.parallelism = Parallelism::Tree;
        let outcome = opener_search("Ah Kd 7c 2s 9h", 400, &options);
        assert!(outcome.simulations >= 400);
        assert!(!outcome.stats.is_empty());

        // Virtual losses must all be paid back.
        let total_visits: u64 = outcome.stats.iter().map(|s| s.visits).sum();
        assert!(total_visits > 0);
    }

    #[test]
    fn root_parallel_mode_merges_worker_trees() {
        let mut options = Options::default();
        options.threads = 2;
        options.parallelism = Parallelism::Root;
        let outcome = opener_search("Ah Kd 7c 2s 9h", 400, &options);
        assert!(outcome.simulations >= 400);
        let total_visits: u64 = outcome.stats.iter().map(|s| s.visits).sum();
        assert!(total_visits >= 400);
    }
}
