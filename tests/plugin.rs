use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_math::DVec3;
use bevy_render::camera::{PerspectiveProjection, Projection};
use bevy_time::{Real, Time};
use bevy_transform::prelude::*;
use bevy_viewport_cam::{controller::sync::vertical_fov, prelude::*};
use bevy_window::RequestRedraw;

fn app() -> App {
    let mut app = App::new();
    app.insert_resource(Time::<Real>::default())
        .add_plugins(ViewportCamPlugin);
    app
}

fn spawn_camera(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            CameraController::default(),
            ViewCamera::default(),
            Transform::default(),
            Projection::Perspective(PerspectiveProjection::default()),
        ))
        .id()
}

fn redraws(app: &App) -> usize {
    app.world().resource::<Events<RequestRedraw>>().len()
}

#[test]
fn idle_camera_does_not_request_redraw() {
    let mut app = app();
    let camera = spawn_camera(&mut app);
    app.update();
    app.update();
    assert_eq!(redraws(&app), 0);
    assert_eq!(
        app.world().get::<ViewCamera>(camera),
        Some(&ViewCamera::default())
    );
}

#[test]
fn momentum_moves_camera_and_syncs_transform() {
    let mut app = app();
    let entity = spawn_camera(&mut app);
    app.update();

    let mut entity_mut = app.world_mut().entity_mut(entity);
    let mut view = *entity_mut.get::<ViewCamera>().unwrap();
    entity_mut
        .get_mut::<CameraController>()
        .unwrap()
        .add_zoom_force(&mut view, -0.5);
    app.update();

    assert!(redraws(&app) > 0);
    let view = app.world().get::<ViewCamera>(entity).unwrap();
    assert!(view.target_distance() < 10.0);

    let transform = app.world().get::<Transform>(entity).unwrap();
    assert!((transform.translation.as_dvec3() - view.position).length() < 1e-4);
    assert!(transform.forward().as_vec3().dot(-bevy_math::Vec3::Z) > 0.999);

    let Some(Projection::Perspective(perspective)) = app.world().get::<Projection>(entity) else {
        panic!("projection kind changed");
    };
    let controller = app.world().get::<CameraController>(entity).unwrap();
    let aspect = controller.viewport_size.x / controller.viewport_size.y;
    assert!((perspective.fov as f64 - vertical_fov(45.0, aspect)).abs() < 1e-6);
}

#[test]
fn camera_spawned_with_a_pose_is_synced() {
    let mut app = app();
    let entity = app
        .world_mut()
        .spawn((
            CameraController::default(),
            ViewCamera::new(DVec3::new(4.0, 3.0, 0.0), DVec3::ZERO, DVec3::Y),
            Transform::default(),
            Projection::Perspective(PerspectiveProjection::default()),
        ))
        .id();
    app.update();
    let transform = app.world().get::<Transform>(entity).unwrap();
    assert_eq!(transform.translation, bevy_math::Vec3::new(4.0, 3.0, 0.0));
}
