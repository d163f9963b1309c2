use nalgebra::{Isometry3, Point3, Vector3};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::collaborators::{GroundContact, GroundProbe, MovableSurface, MoveOutcome, MovePrimitive};
use super::constants::body as body_consts;
use super::constants::movement as movement_consts;

// Characters don't collide with each other, only with world geometry.
const GROUP_WORLD: Group = Group::GROUP_1;
const GROUP_CHARACTER: Group = Group::GROUP_2;

/// Rapier-side state for one character capsule.
pub struct CharacterBody {
    pub collider_handle: ColliderHandle,
    pub body_handle: RigidBodyHandle,
    /// Probe rays are cast down this far from the capsule center before skin width.
    pub half_height: f32,
    /// Position after the last move; the body catches up on the next step.
    position: Vector3<f32>,
}

/// Rapier world hosting static geometry, tagged movable platforms and
/// kinematic character capsules.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    characters: HashMap<u64, CharacterBody>,
    /// Movable surfaces by id
    platforms: HashMap<u64, RigidBodyHandle>,
    /// Reverse lookup used when a probe ray hits a platform
    platform_ids: HashMap<RigidBodyHandle, u64>,
    /// Platform linear velocity sampled from per-tick target translation.
    kinematic_linear_velocities: HashMap<RigidBodyHandle, Vector3<f32>>,
}

fn box_collider(half_extents: Vector3<f32>) -> Collider {
    ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        .collision_groups(InteractionGroups::new(GROUP_WORLD, Group::ALL))
        .build()
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, -movement_consts::DEFAULT_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            characters: HashMap::new(),
            platforms: HashMap::new(),
            platform_ids: HashMap::new(),
            kinematic_linear_velocities: HashMap::new(),
        }
    }

    /// Steps the simulation forward by dt seconds. Kinematic bodies move to
    /// their scheduled positions and the query pipeline is refreshed.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Refreshes scene queries without stepping, e.g. right after building the level.
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Adds immovable world geometry.
    pub fn add_static_box(&mut self, center: Point3<f32>, half_extents: Vector3<f32>) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().translation(center.coords).build();
        let handle = self.rigid_body_set.insert(body);
        self.collider_set
            .insert_with_parent(box_collider(half_extents), handle, &mut self.rigid_body_set);
        handle
    }

    /// Adds a kinematic box tagged as a movable surface under `id`.
    pub fn add_movable_platform(&mut self, id: u64, center: Point3<f32>, half_extents: Vector3<f32>) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(center.coords)
            .build();
        let handle = self.rigid_body_set.insert(body);
        self.collider_set
            .insert_with_parent(box_collider(half_extents), handle, &mut self.rigid_body_set);
        self.platforms.insert(id, handle);
        self.platform_ids.insert(handle, id);
        self.kinematic_linear_velocities.insert(handle, Vector3::zeros());
        handle
    }

    /// Schedules a platform move for the next step and samples its velocity
    /// from the translation over `dt`. Returns false for unknown ids.
    pub fn move_platform(&mut self, id: u64, position: Point3<f32>, dt: f32) -> bool {
        let Some(&handle) = self.platforms.get(&id) else {
            return false;
        };
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        let current = *body.translation();
        let inv_dt = if dt > movement_consts::EPSILON { 1.0 / dt } else { 0.0 };
        self.kinematic_linear_velocities
            .insert(handle, (position.coords - current) * inv_dt);
        body.set_next_kinematic_translation(position.coords);
        true
    }

    /// Sampled velocity of a movable platform.
    pub fn platform_velocity(&self, id: u64) -> Option<Vector3<f32>> {
        let handle = self.platforms.get(&id)?;
        self.kinematic_linear_velocities.get(handle).copied()
    }

    /// Adds a character capsule. `height` is the total capsule height.
    pub fn add_character(&mut self, id: u64, position: Point3<f32>, radius: f32, height: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(position.coords)
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        // half_height is the cylinder part: total height = 2*half_height + 2*radius
        let cylinder_half = (height - 2.0 * radius).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(cylinder_half, radius)
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_WORLD))
            .build();
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.characters.insert(
            id,
            CharacterBody {
                collider_handle,
                body_handle,
                half_height: cylinder_half + radius,
                position: position.coords,
            },
        );
        body_handle
    }

    pub fn character(&self, id: u64) -> Option<&CharacterBody> {
        self.characters.get(&id)
    }

    pub fn character_position(&self, id: u64) -> Option<Point3<f32>> {
        self.characters.get(&id).map(|c| Point3::from(c.position))
    }

    /// Places a character without collision resolution.
    pub fn teleport_character(&mut self, id: u64, position: Point3<f32>) -> bool {
        let Some(character) = self.characters.get_mut(&id) else {
            return false;
        };
        character.position = position.coords;
        if let Some(body) = self.rigid_body_set.get_mut(character.body_handle) {
            body.set_translation(position.coords, true);
        }
        true
    }

    /// Casts a ray downward from `origin`.
    /// Returns the hit collider and distance if world geometry is found within `max_distance`.
    pub fn raycast_down(
        &self,
        origin: Point3<f32>,
        max_distance: f32,
        exclude_body: Option<RigidBodyHandle>,
    ) -> Option<(ColliderHandle, f32)> {
        let ray = Ray::new(origin, vector![0.0, -1.0, 0.0]);
        let mut filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_WORLD));
        if let Some(body_handle) = exclude_body {
            filter = filter.exclude_rigid_body(body_handle);
        }
        self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true, // solid
            filter,
        )
    }

    /// Probes for ground under a character from `position`, casting a center ray
    /// plus four rays around a footprint of `radius`. The closest hit decides
    /// which surface supports the character.
    pub fn probe_ground(&self, id: u64, position: Point3<f32>, radius: f32, skin_width: f32) -> GroundContact {
        let Some(character) = self.characters.get(&id) else {
            return GroundContact::airborne();
        };
        let max_distance = character.half_height + skin_width.max(0.0);
        let r = radius.max(0.0) * std::f32::consts::FRAC_1_SQRT_2;
        let offsets = [
            Vector3::zeros(),
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(-r, 0.0, 0.0),
            Vector3::new(0.0, 0.0, r),
            Vector3::new(0.0, 0.0, -r),
        ];

        let closest = offsets
            .iter()
            .filter_map(|offset| self.raycast_down(position + *offset, max_distance, Some(character.body_handle)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((hit_collider, _)) = closest else {
            return GroundContact::airborne();
        };

        let surface = self
            .collider_set
            .get(hit_collider)
            .and_then(|collider| collider.parent())
            .and_then(|parent| {
                let id = *self.platform_ids.get(&parent)?;
                let velocity = self
                    .kinematic_linear_velocities
                    .get(&parent)
                    .copied()
                    .unwrap_or_else(Vector3::zeros);
                Some(MovableSurface { id, velocity })
            });

        match surface {
            Some(surface) => GroundContact::on_platform(surface),
            None => GroundContact::on_static(),
        }
    }

    /// Moves a character through the kinematic controller, sliding along and
    /// stepping over world geometry.
    pub fn move_character(&mut self, id: u64, desired: Vector3<f32>, dt: f32) -> Option<MoveOutcome> {
        let character = self.characters.get(&id)?;
        let body_handle = character.body_handle;
        let collider = self.collider_set.get(character.collider_handle)?;
        let shape = collider.shape();
        let current_pos = Isometry3::translation(character.position.x, character.position.y, character.position.z);

        let controller = KinematicCharacterController {
            offset: CharacterLength::Absolute(body_consts::CONTROLLER_OFFSET),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(body_consts::AUTOSTEP_MAX_HEIGHT),
                min_width: CharacterLength::Absolute(body_consts::AUTOSTEP_MIN_WIDTH),
                include_dynamic_bodies: true,
            }),
            max_slope_climb_angle: 45.0_f32.to_radians(),
            min_slope_slide_angle: 30.0_f32.to_radians(),
            snap_to_ground: Some(CharacterLength::Absolute(body_consts::SNAP_TO_GROUND)),
            ..Default::default()
        };

        let filter = QueryFilter::default()
            .exclude_rigid_body(body_handle)
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_WORLD, Group::ALL & !GROUP_CHARACTER));

        let movement = controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            shape,
            &current_pos,
            desired,
            filter,
            |_collision| {},
        );

        let new_pos = current_pos.translation.vector + movement.translation;
        if let Some(body) = self.rigid_body_set.get_mut(body_handle) {
            body.set_next_kinematic_translation(new_pos);
        }
        if let Some(character) = self.characters.get_mut(&id) {
            character.position = new_pos;
        }

        Some(MoveOutcome {
            translation: movement.translation,
            grounded: movement.grounded,
        })
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedPhysicsWorld = Rc<RefCell<PhysicsWorld>>;

/// One character in a shared [`PhysicsWorld`], usable as both the ground probe
/// and the move primitive of an agent.
#[derive(Clone)]
pub struct RapierCharacter {
    world: SharedPhysicsWorld,
    id: u64,
}

impl RapierCharacter {
    /// Adds a default-sized capsule for `id` at `position`.
    pub fn spawn(world: &SharedPhysicsWorld, id: u64, position: Point3<f32>) -> Self {
        world.borrow_mut().add_character(
            id,
            position,
            body_consts::CHARACTER_RADIUS,
            body_consts::CHARACTER_HEIGHT,
        );
        Self {
            world: Rc::clone(world),
            id,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl GroundProbe for RapierCharacter {
    fn probe_ground(&mut self, position: Point3<f32>, radius: f32, skin_width: f32) -> GroundContact {
        self.world.borrow().probe_ground(self.id, position, radius, skin_width)
    }
}

impl MovePrimitive for RapierCharacter {
    fn position(&self) -> Point3<f32> {
        self.world
            .borrow()
            .character_position(self.id)
            .unwrap_or_else(Point3::origin)
    }

    fn apply_displacement(&mut self, displacement: Vector3<f32>, dt: f32) -> MoveOutcome {
        self.world
            .borrow_mut()
            .move_character(self.id, displacement, dt)
            .unwrap_or(MoveOutcome {
                translation: Vector3::zeros(),
                grounded: false,
            })
    }

    fn teleport(&mut self, position: Point3<f32>) {
        self.world.borrow_mut().teleport_character(self.id, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        // Floor top at y = 0
        world.add_static_box(Point3::new(0.0, -0.5, 0.0), Vector3::new(50.0, 0.5, 50.0));
        world
    }

    #[test]
    fn test_probe_detects_floor_under_standing_character() {
        let mut world = world_with_floor();
        world.add_character(1, Point3::new(0.0, 0.92, 0.0), 0.4, 1.8);
        world.update_queries();

        let contact = world.probe_ground(1, Point3::new(0.0, 0.92, 0.0), 0.4, 0.08);
        assert!(contact.grounded);
        assert!(contact.surface.is_none());
    }

    #[test]
    fn test_probe_reports_airborne_high_above_floor() {
        let mut world = world_with_floor();
        world.add_character(1, Point3::new(0.0, 5.0, 0.0), 0.4, 1.8);
        world.update_queries();

        let contact = world.probe_ground(1, Point3::new(0.0, 5.0, 0.0), 0.4, 0.08);
        assert!(!contact.grounded);
    }

    #[test]
    fn test_probe_unknown_character_is_airborne() {
        let world = world_with_floor();
        assert!(!world.probe_ground(99, Point3::origin(), 0.4, 0.08).grounded);
    }

    #[test]
    fn test_platform_velocity_sampled_from_translation() {
        let mut world = PhysicsWorld::new();
        world.add_movable_platform(7, Point3::new(0.0, -0.5, 0.0), Vector3::new(2.0, 0.5, 2.0));
        world.add_character(1, Point3::new(0.0, 0.92, 0.0), 0.4, 1.8);
        world.update_queries();

        assert!(world.move_platform(7, Point3::new(0.1, -0.5, 0.0), 0.05));
        world.step(0.05);

        let v = world.platform_velocity(7).unwrap();
        assert!((v.x - 2.0).abs() < 1e-3, "sampled velocity {v:?}");

        let contact = world.probe_ground(1, Point3::new(0.0, 0.92, 0.0), 0.4, 0.08);
        assert!(contact.grounded);
        let surface = contact.surface.expect("platform should be reported as movable");
        assert_eq!(surface.id, 7);
        assert!((surface.velocity.x - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_move_platform_unknown_id() {
        let mut world = PhysicsWorld::new();
        assert!(!world.move_platform(3, Point3::origin(), DT));
    }

    #[test]
    fn test_character_falls_onto_floor() {
        let mut world = world_with_floor();
        world.add_character(1, Point3::new(0.0, 3.0, 0.0), 0.4, 1.8);
        world.update_queries();

        let mut grounded = false;
        for _ in 0..120 {
            let outcome = world.move_character(1, Vector3::new(0.0, -0.1, 0.0), DT).unwrap();
            grounded = outcome.grounded;
            world.step(DT);
        }
        let pos = world.character_position(1).unwrap();
        assert!(grounded);
        assert!(pos.y > 0.8 && pos.y < 1.1, "resting center y={}", pos.y);
    }

    #[test]
    fn test_character_blocked_by_wall() {
        let mut world = world_with_floor();
        world.add_static_box(Point3::new(3.0, 1.5, 0.0), Vector3::new(0.5, 1.5, 4.0));
        world.add_character(1, Point3::new(0.0, 0.92, 0.0), 0.4, 1.8);
        world.update_queries();

        for _ in 0..120 {
            world.move_character(1, Vector3::new(0.1, 0.0, 0.0), DT);
            world.step(DT);
        }
        let pos = world.character_position(1).unwrap();
        assert!(pos.x < 2.5, "character passed through wall: x={}", pos.x);
    }

    #[test]
    fn test_teleport_moves_character_immediately() {
        let mut world = world_with_floor();
        world.add_character(1, Point3::new(0.0, 0.92, 0.0), 0.4, 1.8);
        assert!(world.teleport_character(1, Point3::new(4.0, 2.0, -1.0)));
        assert_eq!(world.character_position(1), Some(Point3::new(4.0, 2.0, -1.0)));
        world.step(DT);
        let body = world.character(1).unwrap().body_handle;
        let translation = *world.rigid_body_set.get(body).unwrap().translation();
        assert!((translation - Vector3::new(4.0, 2.0, -1.0)).norm() < 1e-4);
        assert!(!world.teleport_character(2, Point3::origin()));
    }

    #[test]
    fn test_rapier_character_shares_world() {
        let world: SharedPhysicsWorld = Rc::new(RefCell::new(world_with_floor()));
        let mut character = RapierCharacter::spawn(&world, 5, Point3::new(0.0, 0.92, 0.0));
        world.borrow_mut().update_queries();

        assert!(character.probe_ground(character.position(), 0.4, 0.08).grounded);
        character.teleport(Point3::new(0.0, 10.0, 0.0));
        assert_eq!(world.borrow().character_position(5), Some(Point3::new(0.0, 10.0, 0.0)));
    }
}
