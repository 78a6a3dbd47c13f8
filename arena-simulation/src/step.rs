//! The per-tick entity update: energy, growth, division, behavior, steering
//! and motion, applied to every living entity in a single pass.
//!
//! Entities are visited by index up to the length the list had when the tick
//! started. Offspring are appended during the pass and first simulated on the
//! following tick; existing indices never move, which keeps
//! [`FollowTarget::Entity`] references valid.

use crate::factory::{create_entity, EntityTemplate};
use crate::spatial::SpatialQuery;
use arena_core::math::{angle_to, magnitude, normalize_angle};
use arena_core::{Entity, FollowTarget, Metabolism, Player, Players, WorldBounds};
use glam::Vec2;
use log::trace;
use rand::Rng;
use std::f32::consts::TAU;
use std::ops::{AddAssign, Range};

/// Fixed tick rate all per-second rates are expressed against.
pub const TICKS_PER_SECOND: f32 = 60.0;

const GROWTH_ENERGY_RATIO: f32 = 0.5;
const SHRINK_PER_TICK: f32 = 0.1;
const MIN_RADIUS_FACTOR: f32 = 0.5;

const DIVISION_SIZE_WEIGHT: f32 = 10.0;
const OFFSPRING_SPREAD: f32 = 20.0;
const DIVISION_ENERGY_SHARE: f32 = 0.4;
const DIVISION_SIZE_SHARE: f32 = 0.7;
const OFFSPRING_THRESHOLD_FACTOR: f32 = 0.9;

pub const FOLLOW_SEARCH_RADIUS: f32 = 400.0;
const FOLLOW_CHANCE: f64 = 0.2;
const FOLLOW_COOLDOWN_TICKS: Range<u32> = 40..80;
const CHASE_SPEED_FLOOR: f32 = 0.7;
const WANDER_COOLDOWN_TICKS: Range<u32> = 30..90;

const SPEED_BLEND: f32 = 0.05;

/// What happened during one call to [`update`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub entity_deaths: usize,
    pub player_deaths: usize,
    pub births: usize,
}

impl StepReport {
    pub fn is_quiet(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for StepReport {
    fn add_assign(&mut self, rhs: Self) {
        self.entity_deaths += rhs.entity_deaths;
        self.player_deaths += rhs.player_deaths;
        self.births += rhs.births;
    }
}

/// Advances the whole population by one tick.
///
/// Players are drained first, then each entity that was present at the start
/// of the call goes through drain, size, division, follow refresh, heading,
/// steering and motion, in that order.
pub fn update<S, R>(
    entities: &mut Vec<Entity>,
    players: &mut Players,
    spatial: &S,
    bounds: &WorldBounds,
    rng: &mut R,
) -> StepReport
where
    S: SpatialQuery + ?Sized,
    R: Rng + ?Sized,
{
    let mut report = StepReport {
        player_deaths: drain_players(players),
        ..StepReport::default()
    };
    let players: &Players = players;

    let count = entities.len();
    for index in 0..count {
        if !entities[index].alive() {
            continue;
        }

        if !drain_energy(&mut entities[index]) {
            trace!("entity {index} starved");
            report.entity_deaths += 1;
            continue;
        }

        update_size(&mut entities[index]);

        if let Some(offspring) = try_divide(&mut entities[index], bounds, rng) {
            trace!(
                "entity {index} divided, offspring {} at generation {}",
                entities.len(),
                offspring.generation
            );
            entities.push(offspring);
            report.births += 1;
        }

        refresh_follow(index, entities, players, spatial, rng);

        let target = resolve_target(&entities[index], entities, players);
        let entity = &mut entities[index];
        choose_heading(entity, target, rng);
        steer(entity);
        integrate(entity, bounds);
    }

    report
}

/// Movement drain and death check for every living player. Returns how many died.
pub fn drain_players(players: &mut Players) -> usize {
    players
        .values_mut()
        .filter(|p| p.alive())
        .map(drain_energy::<Player>)
        .filter(|alive| !alive)
        .count()
}

/// Charges one tick of movement cost. Returns `false` if the actor just died.
///
/// Energy is clamped into `[0, max_energy]` before charging so malformed
/// values cannot escape the range.
pub fn drain_energy<A: Metabolism>(actor: &mut A) -> bool {
    let mut energy = actor.energy().min(actor.max_energy());
    if actor.is_moving() {
        energy -= actor.consumption_rate() / TICKS_PER_SECOND;
    }

    if energy <= 0.0 {
        actor.kill();
        return false;
    }
    actor.set_energy(energy);
    true
}

/// Radius tracks surplus energy above half capacity; below that it decays
/// toward half the base radius.
pub fn update_size(entity: &mut Entity) {
    let half_capacity = entity.max_energy * GROWTH_ENERGY_RATIO;
    if entity.energy > half_capacity {
        entity.radius = entity.base_radius + (entity.energy - half_capacity) * entity.growth_rate;
    } else {
        let floor = entity.base_radius * MIN_RADIUS_FACTOR;
        entity.radius = (entity.radius - SHRINK_PER_TICK).max(floor);
    }
}

/// Combined energy and size score compared against `division_threshold`.
pub fn division_value(entity: &Entity) -> f32 {
    entity.energy + (entity.radius - entity.base_radius) * DIVISION_SIZE_WEIGHT
}

/// Ticks the division cooldown and splits the entity if it is ready.
///
/// The parent keeps its base radius but gives up 60% of its energy and 30% of
/// its radius, never dropping below half its base radius. The returned
/// offspring is the caller's to append.
pub fn try_divide<R: Rng + ?Sized>(
    parent: &mut Entity,
    bounds: &WorldBounds,
    rng: &mut R,
) -> Option<Entity> {
    parent.division_cooldown = parent.division_cooldown.saturating_sub(1);
    if parent.division_cooldown > 0 || division_value(parent) < parent.division_threshold {
        return None;
    }

    let mut offspring = create_entity(&EntityTemplate::inherited_from(parent), bounds, rng);
    offspring.pos = parent.pos
        + Vec2::new(
            rng.gen_range(-OFFSPRING_SPREAD..=OFFSPRING_SPREAD),
            rng.gen_range(-OFFSPRING_SPREAD..=OFFSPRING_SPREAD),
        );
    offspring.energy = parent.energy * DIVISION_ENERGY_SHARE;
    offspring.base_radius = parent.base_radius * DIVISION_SIZE_SHARE;
    offspring.radius =
        (parent.radius * DIVISION_SIZE_SHARE).max(offspring.base_radius * MIN_RADIUS_FACTOR);
    offspring.generation = parent.generation + 1;
    offspring.division_threshold = parent.division_threshold * OFFSPRING_THRESHOLD_FACTOR;
    offspring.division_cooldown = parent.division_cooldown_time;

    parent.energy *= DIVISION_ENERGY_SHARE;
    parent.radius =
        (parent.radius * DIVISION_SIZE_SHARE).max(parent.base_radius * MIN_RADIUS_FACTOR);
    parent.division_cooldown = parent.division_cooldown_time;

    Some(offspring)
}

/// Periodically re-decides whether `entities[index]` follows anyone.
///
/// One time in five the nearest target within [`FOLLOW_SEARCH_RADIUS`] is
/// adopted (or the target cleared if there is none); otherwise following
/// stops. Either way the next decision is 40 to 79 ticks away.
pub fn refresh_follow<S, R>(
    index: usize,
    entities: &mut [Entity],
    players: &Players,
    spatial: &S,
    rng: &mut R,
) where
    S: SpatialQuery + ?Sized,
    R: Rng + ?Sized,
{
    let cooldown = &mut entities[index].follow_cooldown;
    *cooldown = cooldown.saturating_sub(1);
    if *cooldown > 0 {
        return;
    }

    let target = if rng.gen_bool(FOLLOW_CHANCE) {
        spatial
            .find_nearest_target(index, FOLLOW_SEARCH_RADIUS, entities, players)
            .map(|nearest| nearest.target)
    } else {
        None
    };

    let entity = &mut entities[index];
    entity.follow_target = target;
    entity.follow_cooldown = rng.gen_range(FOLLOW_COOLDOWN_TICKS);
}

/// Position of the entity's follow target, if it still resolves to something alive.
pub fn resolve_target(entity: &Entity, entities: &[Entity], players: &Players) -> Option<Vec2> {
    match entity.follow_target.as_ref()? {
        FollowTarget::Player(id) => players.get(id).filter(|p| p.alive()).map(|p| p.pos),
        FollowTarget::Entity(index) => entities
            .get(*index)
            .filter(|e| e.is_alive)
            .map(|e| e.pos),
    }
}

/// Sets the desired heading and speed: chase the target if there is one,
/// otherwise wander with a fresh random heading whenever the wander cooldown
/// has run out.
pub fn choose_heading<R: Rng + ?Sized>(entity: &mut Entity, target: Option<Vec2>, rng: &mut R) {
    match target {
        Some(target_pos) => {
            entity.target_angle = angle_to(entity.pos, target_pos);
            let chase = CHASE_SPEED_FLOOR + (1.0 - CHASE_SPEED_FLOOR) * rng.gen::<f32>();
            entity.target_speed = entity.max_speed * chase;
        }
        None if entity.change_dir_cooldown == 0 => {
            entity.target_angle = rng.gen::<f32>() * TAU;
            entity.target_speed = rng.gen::<f32>() * entity.max_speed;
            entity.change_dir_cooldown = rng.gen_range(WANDER_COOLDOWN_TICKS);
        }
        None => entity.change_dir_cooldown -= 1,
    }
}

/// Turns at most `rotation_speed` toward the desired heading and eases speed
/// toward the desired speed.
pub fn steer(entity: &mut Entity) {
    let diff = normalize_angle(entity.target_angle - entity.angle);
    if diff.abs() < entity.rotation_speed {
        entity.angle = entity.target_angle;
    } else {
        entity.angle = normalize_angle(entity.angle + diff.signum() * entity.rotation_speed);
    }

    entity.speed += (entity.target_speed - entity.speed) * SPEED_BLEND;
}

/// Thrust along the heading, speed cap, friction, then position update and
/// arena clamp.
pub fn integrate(entity: &mut Entity, bounds: &WorldBounds) {
    if entity.max_speed > 0.0 {
        let thrust = entity.acceleration * entity.speed / entity.max_speed;
        entity.vel += Vec2::new(entity.angle.cos(), entity.angle.sin()) * thrust;
    }

    let v = magnitude(entity.vel);
    if v > entity.max_speed {
        entity.vel *= entity.max_speed / v;
    }

    entity.vel *= entity.friction;
    entity.pos += entity.vel;
    entity.pos = bounds.clamp_circle(entity.pos, entity.radius);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{create_default_entity, spawn_population};
    use crate::spatial::{LinearScan, NearestTarget, SpatialGrid};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f32::consts::PI;

    const EPS: f32 = 1e-4;

    fn bounds() -> WorldBounds {
        WorldBounds::new(1000.0, 800.0)
    }

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn entity(seed: u64) -> Entity {
        create_default_entity(&bounds(), &mut rng(seed))
    }

    /// Always answers with the same target, regardless of geometry.
    struct Fixed(Option<FollowTarget>);

    impl SpatialQuery for Fixed {
        fn find_nearest_target(
            &self,
            _origin: usize,
            _max_radius: f32,
            _entities: &[Entity],
            _players: &Players,
        ) -> Option<NearestTarget> {
            self.0.clone().map(|target| NearestTarget { target, distance: 1.0 })
        }
    }

    #[test]
    fn division_splits_energy_and_size() {
        let mut parent = entity(1);
        parent.energy = 160.0;
        parent.radius = 25.4;
        parent.base_radius = 18.0;
        parent.division_threshold = 150.0;
        parent.division_cooldown = 0;
        parent.generation = 3;
        assert!((division_value(&parent) - 234.0).abs() < EPS);

        let offspring = try_divide(&mut parent, &bounds(), &mut rng(2)).expect("should divide");

        assert!((parent.energy - 64.0).abs() < EPS);
        assert!((parent.radius - 17.78).abs() < EPS);
        assert_eq!(parent.base_radius, 18.0);
        assert_eq!(parent.division_cooldown, 600);

        assert!((offspring.energy - 64.0).abs() < EPS);
        assert!((offspring.radius - 17.78).abs() < EPS);
        assert!((offspring.base_radius - 12.6).abs() < EPS);
        assert_eq!(offspring.generation, 4);
        assert!((offspring.division_threshold - 135.0).abs() < EPS);
        assert_eq!(offspring.division_cooldown, 600);
        assert!((offspring.pos - parent.pos).abs().max_element() <= 20.0 + EPS);
        assert!(offspring.is_alive);
    }

    #[test]
    fn division_at_shrink_floor_keeps_both_radii_on_floor() {
        let mut parent = entity(3);
        parent.base_radius = 2.0;
        parent.radius = 1.0;
        parent.energy = 30.0;
        parent.division_threshold = 10.0;
        parent.division_cooldown = 0;
        parent.vel = Vec2::ZERO;
        parent.speed = 0.0;
        parent.target_speed = 0.0;
        let mut entities = vec![parent];
        let mut players = Players::new();

        let report = update(&mut entities, &mut players, &LinearScan, &bounds(), &mut rng(4));

        assert_eq!(report.births, 1);
        for e in &entities {
            assert!(
                e.radius >= e.base_radius * MIN_RADIUS_FACTOR,
                "radius {} below floor {}",
                e.radius,
                e.base_radius * MIN_RADIUS_FACTOR
            );
        }
        assert_eq!(entities[0].radius, 1.0);
        assert!((entities[1].radius - 0.7).abs() < EPS);
    }

    #[test]
    fn division_waits_for_cooldown() {
        let mut parent = entity(5);
        parent.energy = 160.0;
        parent.radius = 25.4;
        parent.division_cooldown = 2;
        let mut rng = rng(6);

        assert!(try_divide(&mut parent, &bounds(), &mut rng).is_none());
        assert_eq!(parent.division_cooldown, 1);
        let energy_before = parent.energy;

        assert!(try_divide(&mut parent, &bounds(), &mut rng).is_some());
        assert!(parent.energy < energy_before);

        parent.energy = 160.0;
        parent.radius = 25.4;
        assert!(try_divide(&mut parent, &bounds(), &mut rng).is_none());
        assert_eq!(parent.division_cooldown, 599);
    }

    #[test]
    fn below_threshold_never_divides() {
        let mut e = entity(9);
        e.energy = 40.0;
        e.radius = e.base_radius;
        assert!(try_divide(&mut e, &bounds(), &mut rng(9)).is_none());
        assert_eq!(e.division_cooldown, 0);
    }

    #[test]
    fn moving_entity_starves() {
        let mut e = entity(3);
        e.energy = 0.01;
        e.vel = Vec2::new(0.5, 0.0);
        e.energy_consumption_rate = 1.5;

        assert!(!drain_energy(&mut e));
        assert!(!e.is_alive);
        assert_eq!(e.energy, 0.0);
    }

    #[test]
    fn stationary_actor_keeps_energy() {
        let mut e = entity(3);
        e.energy = 42.0;
        e.vel = Vec2::new(0.05, -0.1);
        assert!(drain_energy(&mut e));
        assert_eq!(e.energy, 42.0);

        e.vel = Vec2::new(0.0, 0.2);
        assert!(drain_energy(&mut e));
        assert!((e.energy - (42.0 - 1.5 / 60.0)).abs() < EPS);
    }

    #[test]
    fn excess_energy_is_clamped() {
        let mut e = entity(4);
        e.energy = 250.0;
        assert!(drain_energy(&mut e));
        assert_eq!(e.energy, e.max_energy);
    }

    #[test]
    fn players_drain_and_die() {
        let mut players = Players::new();
        let mut walker = Player::new(Vec2::new(10.0, 10.0));
        walker.vel = Vec2::new(1.0, 0.0);
        let mut dying = walker.clone();
        dying.energy = 0.02;
        let idle = Player::new(Vec2::new(20.0, 20.0));
        players.insert("walker".into(), walker);
        players.insert("dying".into(), dying);
        players.insert("idle".into(), idle);

        assert_eq!(drain_players(&mut players), 1);
        assert!((players["walker"].energy - (100.0 - 1.5 / 60.0)).abs() < EPS);
        assert_eq!(players["idle"].energy, 100.0);
        assert!(!players["dying"].is_alive);
        assert_eq!(players["dying"].energy, 0.0);

        // Already dead players are not counted again.
        assert_eq!(drain_players(&mut players), 0);
    }

    #[test]
    fn growth_tracks_surplus_energy() {
        let mut e = entity(8);
        e.energy = 80.0;
        update_size(&mut e);
        assert!((e.radius - (18.0 + 30.0 * 0.1)).abs() < EPS);

        // Recomputed, not accumulated.
        update_size(&mut e);
        assert!((e.radius - 21.0).abs() < EPS);
    }

    #[test]
    fn shrink_stops_at_floor() {
        let mut e = entity(8);
        e.energy = 30.0;
        e.radius = 9.25;
        update_size(&mut e);
        assert!((e.radius - 9.15).abs() < EPS);

        for _ in 0..10 {
            update_size(&mut e);
        }
        assert_eq!(e.radius, 9.0);
    }

    #[test]
    fn steering_turns_at_fixed_rate_then_snaps() {
        let mut e = entity(10);
        e.angle = 0.0;
        e.target_angle = PI;
        e.rotation_speed = 0.04;

        steer(&mut e);
        assert!((e.angle - 0.04).abs() < 1e-6);

        for _ in 1..78 {
            steer(&mut e);
        }
        assert!((e.angle - 78.0 * 0.04).abs() < 1e-3);
        assert_ne!(e.angle, PI);

        steer(&mut e);
        assert_eq!(e.angle, PI);
    }

    #[test]
    fn steering_takes_short_way_round() {
        let mut e = entity(11);
        e.angle = 0.1;
        e.target_angle = TAU - 0.1;
        e.rotation_speed = 0.04;
        steer(&mut e);
        assert!((e.angle - 0.06).abs() < 1e-5);
    }

    #[test]
    fn speed_eases_toward_target() {
        let mut e = entity(12);
        e.speed = 0.0;
        e.target_speed = 2.0;
        steer(&mut e);
        assert!((e.speed - 0.1).abs() < EPS);
        for _ in 0..500 {
            steer(&mut e);
        }
        assert!((e.speed - 2.0).abs() < 1e-3);
    }

    #[test]
    fn velocity_never_exceeds_max_speed() {
        let mut rng = rng(13);
        for _ in 0..1000 {
            let mut e = entity(14);
            e.vel = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            e.speed = rng.gen_range(0.0..e.max_speed);
            e.angle = rng.gen::<f32>() * TAU;
            e.friction = rng.gen_range(0.01..=1.0);
            integrate(&mut e, &bounds());
            assert!(magnitude(e.vel) <= e.max_speed + 1e-4);
        }
    }

    #[test]
    fn position_is_clamped_inside_arena() {
        let mut rng = rng(15);
        let b = bounds();
        for _ in 0..1000 {
            let mut e = entity(16);
            e.radius = rng.gen_range(1.0..b.height / 2.0);
            e.pos = Vec2::new(rng.gen_range(-500.0..1500.0), rng.gen_range(-500.0..1300.0));
            integrate(&mut e, &b);
            assert!(b.contains_circle(e.pos, e.radius), "{:?} r={}", e.pos, e.radius);
        }
    }

    #[test]
    fn zero_max_speed_does_not_produce_nan() {
        let mut e = entity(17);
        e.max_speed = 0.0;
        e.speed = 1.0;
        integrate(&mut e, &bounds());
        assert!(e.vel.is_finite());
        assert!(e.pos.is_finite());
    }

    #[test]
    fn follow_refresh_respects_cooldown() {
        let mut entities = vec![entity(20), entity(21)];
        entities[0].follow_cooldown = 5;
        entities[0].follow_target = Some(FollowTarget::Entity(1));

        refresh_follow(0, &mut entities, &Players::new(), &Fixed(None), &mut rng(22));
        assert_eq!(entities[0].follow_cooldown, 4);
        assert_eq!(entities[0].follow_target, Some(FollowTarget::Entity(1)));
    }

    #[test]
    fn follow_refresh_mostly_stops_following() {
        let spatial = Fixed(Some(FollowTarget::Player("p1".into())));
        let mut entities = vec![entity(23)];
        let mut rng = rng(24);
        let mut following = 0;

        for _ in 0..2000 {
            entities[0].follow_cooldown = 0;
            refresh_follow(0, &mut entities, &Players::new(), &spatial, &mut rng);
            assert!(FOLLOW_COOLDOWN_TICKS.contains(&entities[0].follow_cooldown));
            if let Some(target) = &entities[0].follow_target {
                assert_eq!(target, &FollowTarget::Player("p1".into()));
                following += 1;
            }
        }
        assert!((300..500).contains(&following), "followed {following} of 2000");
    }

    #[test]
    fn follow_refresh_clears_when_nothing_nearby() {
        let mut entities = vec![entity(25)];
        let mut rng = rng(26);
        for _ in 0..200 {
            entities[0].follow_target = Some(FollowTarget::Entity(7));
            entities[0].follow_cooldown = 0;
            refresh_follow(0, &mut entities, &Players::new(), &Fixed(None), &mut rng);
            assert_eq!(entities[0].follow_target, None);
        }
    }

    #[test]
    fn chasing_points_at_live_target() {
        let mut entities = vec![entity(30), entity(31)];
        entities[0].pos = Vec2::new(100.0, 100.0);
        entities[1].pos = Vec2::new(100.0, 200.0);
        entities[0].follow_target = Some(FollowTarget::Entity(1));

        let target = resolve_target(&entities[0], &entities, &Players::new());
        assert_eq!(target, Some(Vec2::new(100.0, 200.0)));

        let mut e = entities[0].clone();
        choose_heading(&mut e, target, &mut rng(32));
        assert!((e.target_angle - PI / 2.0).abs() < EPS);
        assert!(e.target_speed >= 0.7 * e.max_speed && e.target_speed < e.max_speed + EPS);
    }

    #[test]
    fn stale_targets_resolve_to_nothing() {
        let mut players = Players::new();
        let mut ghost = Player::new(Vec2::ZERO);
        ghost.kill();
        players.insert("ghost".into(), ghost);

        let mut entities = vec![entity(33), entity(34)];
        entities[1].is_alive = false;

        for stale in [
            FollowTarget::Entity(1),
            FollowTarget::Entity(99),
            FollowTarget::Player("ghost".into()),
            FollowTarget::Player("gone".into()),
        ] {
            entities[0].follow_target = Some(stale);
            assert_eq!(resolve_target(&entities[0], &entities, &players), None);
        }
    }

    #[test]
    fn wandering_picks_new_heading_when_cooldown_expires() {
        let mut e = entity(35);
        e.change_dir_cooldown = 2;
        let before = (e.target_angle, e.target_speed);
        let mut rng = rng(36);

        choose_heading(&mut e, None, &mut rng);
        choose_heading(&mut e, None, &mut rng);
        assert_eq!(e.change_dir_cooldown, 0);
        assert_eq!((e.target_angle, e.target_speed), before);

        choose_heading(&mut e, None, &mut rng);
        assert!(WANDER_COOLDOWN_TICKS.contains(&e.change_dir_cooldown));
        assert!((0.0..TAU).contains(&e.target_angle));
        assert!((0.0..e.max_speed).contains(&e.target_speed));
    }

    #[test]
    fn offspring_wait_until_next_tick() {
        let mut entities = vec![entity(40)];
        entities[0].division_threshold = 100.0;
        let mut players = Players::new();
        let mut rng = rng(41);

        let report = update(&mut entities, &mut players, &LinearScan, &bounds(), &mut rng);
        assert_eq!(report.births, 1);
        assert_eq!(entities.len(), 2);

        let offspring = &entities[1];
        assert_eq!(offspring.division_cooldown, 600);
        assert_eq!(offspring.follow_cooldown, 0);
        assert_eq!(offspring.change_dir_cooldown, 0);
        assert_eq!(offspring.vel, Vec2::ZERO);
        assert_eq!(offspring.speed, 0.0);

        update(&mut entities, &mut players, &LinearScan, &bounds(), &mut rng);
        assert_eq!(entities[1].division_cooldown, 599);
        assert!(entities[1].follow_cooldown > 0);
    }

    #[test]
    fn dead_entities_are_frozen() {
        let b = bounds();
        let mut rng = rng(50);
        let mut entities = spawn_population(20, &EntityTemplate::default(), &b, &mut rng);
        entities[3].kill();
        entities[3].vel = Vec2::new(2.0, 1.0);
        entities[3].follow_target = Some(FollowTarget::Entity(4));
        let frozen = entities[3].clone();
        let mut players = Players::new();

        for _ in 0..300 {
            update(&mut entities, &mut players, &LinearScan, &b, &mut rng);
            assert_eq!(entities[3], frozen);
        }
    }

    #[test]
    fn starving_entity_dies_once_and_stays_dead() {
        let mut entities = vec![entity(60)];
        entities[0].energy = 0.01;
        entities[0].vel = Vec2::new(1.0, 0.0);
        let mut players = Players::new();
        let mut rng = rng(61);

        let report = update(&mut entities, &mut players, &LinearScan, &bounds(), &mut rng);
        assert_eq!(report.entity_deaths, 1);
        assert!(!entities[0].is_alive);
        assert_eq!(entities[0].energy, 0.0);

        let report = update(&mut entities, &mut players, &LinearScan, &bounds(), &mut rng);
        assert!(report.is_quiet());
    }

    #[test]
    fn invariants_hold_over_long_run() {
        let b = WorldBounds::new(1500.0, 1200.0);
        let mut rng = rng(70);
        let mut entities = spawn_population(150, &EntityTemplate::default(), &b, &mut rng);
        let mut players = Players::new();
        for i in 0..3 {
            let mut p = Player::new(Vec2::new(300.0 * (i + 1) as f32, 600.0));
            p.vel = Vec2::new(0.5, 0.0);
            players.insert(format!("player-{i}"), p);
        }
        let mut grid = SpatialGrid::new(&b, 100.0);
        let mut totals = StepReport::default();

        for _ in 0..1500 {
            grid.rebuild(&entities, &players);
            totals += update(&mut entities, &mut players, &grid, &b, &mut rng);

            for e in &entities {
                assert!(e.radius >= e.base_radius * MIN_RADIUS_FACTOR - EPS);
                assert!(e.energy >= 0.0 && e.energy <= e.max_energy);
                assert!(magnitude(e.vel) <= e.max_speed + EPS);
                if !e.is_alive {
                    assert_eq!(e.energy, 0.0);
                }
            }
        }

        assert!(totals.births > 0);
        assert_eq!(entities.len(), 150 + totals.births);
    }

    #[test]
    fn same_seed_replays_identically() {
        let b = bounds();
        let run = |seed: u64| {
            let mut rng = rng(seed);
            let mut entities = spawn_population(40, &EntityTemplate::default(), &b, &mut rng);
            let mut players = Players::new();
            players.insert("p".into(), Player::new(Vec2::new(500.0, 400.0)));
            for _ in 0..200 {
                update(&mut entities, &mut players, &LinearScan, &b, &mut rng);
            }
            entities
        };
        assert_eq!(run(77), run(77));
    }
}
