mod common;

use common::{Harness, png_bytes};
use globe::events::{IMAGERY_FALLBACKS, RESIZES_SKIPPED};
use globe::{GlobeEvent, GlobeOptions, GlobeUpdate, HostChild, InputEvent, ListenerKind, TextureLoadError};
use gpu::renderer::RenderEvent;
use gpu::resources::ResourceKey;
use layers::data::{Beacon, GlobeMode};
use pretty_assertions::assert_eq;

fn destroyed_events(h: &Harness) -> usize {
    h.engine
        .events()
        .iter()
        .filter(|e| e.payload == GlobeEvent::Destroyed)
        .count()
}

#[test]
fn create_attaches_surface_overlay_and_listeners() {
    let h = Harness::new(GlobeOptions::default());
    assert_eq!(h.host.children(), vec![HostChild::Surface, HostChild::LabelOverlay]);
    assert_eq!(h.host.active_listeners(), ListenerKind::ALL.len());
    for kind in ListenerKind::ALL {
        assert_eq!(h.host.active_listeners_of(kind), 1, "{kind:?}");
    }
    assert!(h.engine.is_running());
}

#[test]
fn destroy_twice_is_harmless_and_stops_rendering() {
    let mut h = Harness::new(GlobeOptions::default().with_beacons(vec![Beacon::new("a", 1.0, 2.0)]));
    h.ticks(3);
    assert_eq!(h.scene_renders(), 3);

    h.engine.destroy();
    h.engine.destroy();
    assert_eq!(destroyed_events(&h), 1);
    assert!(h.engine.is_destroyed());
    assert!(!h.engine.is_running());

    let len = h.log_len();
    assert!(!h.engine.tick(0.016));
    h.engine.on_host_resized();
    assert_eq!(h.log_len(), len);
    assert_eq!(h.scene_renders(), 3);

    let disposals = h
        .log
        .borrow()
        .iter()
        .filter(|e| matches!(e, RenderEvent::SurfaceDisposed))
        .count();
    assert_eq!(disposals, 1);
}

#[test]
fn teardown_removes_every_listener_and_child() {
    let h = Harness::new(GlobeOptions::default());
    let host = h.host.clone();
    drop(h);
    assert_eq!(host.active_listeners(), 0);
    assert_eq!(host.stale_removals(), 0);
    assert!(host.children().is_empty());
}

#[test]
fn shared_glow_texture_is_released_exactly_once() {
    let mut h = Harness::new(GlobeOptions::default().with_beacons(vec![
        Beacon::new("a", 1.0, 2.0),
        Beacon::new("b", 3.0, 4.0),
    ]));
    let glow = ResourceKey::Texture(h.engine.scene().glow_texture());

    // Rebuilding layers never touches the shared texture.
    h.engine
        .update(GlobeUpdate {
            beacons: Some(vec![Beacon::new("c", 5.0, 6.0)]),
            ..GlobeUpdate::default()
        })
        .unwrap();
    assert_eq!(h.engine.scene().resources().disposal_count(glow), 0);

    h.engine.destroy();
    h.engine.destroy();
    let resources = h.engine.scene().resources();
    assert_eq!(resources.disposal_count(glow), 1);
    assert_eq!(resources.live_count(), 0);
}

#[test]
fn texture_resolving_after_destroy_is_a_noop() {
    let url = "https://imagery.example/earth.jpg";
    let mut h = Harness::new(GlobeOptions::default().with_imagery(url, true));
    assert_eq!(h.textures.pending_urls(), vec![url.to_string()]);

    h.engine.destroy();
    let len = h.log_len();
    assert!(h.textures.resolve(url, png_bytes()));
    assert!(!h.engine.tick(0.016));
    assert_eq!(h.log_len(), len);
}

#[test]
fn imagery_swaps_in_without_a_blank_frame() {
    let url = "earth.png";
    let mut h = Harness::new(GlobeOptions::default().with_imagery(url, true));
    let fallback = h.engine.scene().fallback_texture();
    h.ticks(2);
    assert_eq!(h.engine.scene().surface_texture(), Some(fallback));

    assert!(h.textures.resolve(url, png_bytes()));
    // Still the fallback until the next frame picks the result up.
    assert_eq!(h.engine.scene().surface_texture(), Some(fallback));
    h.ticks(1);
    let bound = h.engine.scene().surface_texture();
    assert!(bound.is_some());
    assert_ne!(bound, Some(fallback));
    assert!(
        h.engine
            .events()
            .iter()
            .any(|e| e.payload == GlobeEvent::ImageryBound { url: url.to_string() })
    );
}

#[test]
fn failed_imagery_keeps_the_procedural_surface() {
    let url = "missing.png";
    let mut h = Harness::new(GlobeOptions::default().with_imagery(url, true));
    let fallback = h.engine.scene().fallback_texture();
    let err = TextureLoadError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "404"));
    assert!(h.textures.fail(url, err));
    h.ticks(1);
    assert_eq!(h.engine.scene().surface_texture(), Some(fallback));
    assert_eq!(h.engine.metrics().counter(IMAGERY_FALLBACKS), 1);
}

#[test]
fn imagery_without_consent_is_never_fetched() {
    let h = Harness::new(GlobeOptions::default().with_imagery("earth.png", false));
    assert!(h.textures.pending_urls().is_empty());
    assert_eq!(h.engine.metrics().counter(IMAGERY_FALLBACKS), 1);
}

#[test]
fn superseded_imagery_is_ignored() {
    let mut h = Harness::new(GlobeOptions::default().with_imagery("old.png", true));
    h.engine
        .update(GlobeUpdate {
            imagery_url: Some("new.png".to_string()),
            ..GlobeUpdate::default()
        })
        .unwrap();
    let fallback = h.engine.scene().fallback_texture();
    assert!(h.textures.resolve("old.png", png_bytes()));
    h.ticks(1);
    assert_eq!(h.engine.scene().surface_texture(), Some(fallback));

    assert!(h.textures.resolve("new.png", png_bytes()));
    h.ticks(1);
    assert_ne!(h.engine.scene().surface_texture(), Some(fallback));
}

#[test]
fn resize_updates_camera_and_both_renderers() {
    let mut h = Harness::new(GlobeOptions::default());
    h.log.borrow_mut().clear();

    h.engine.handle_input(InputEvent::Resize {
        width: 1024.0,
        height: 512.0,
        device_pixel_ratio: 3.0,
    });
    assert_eq!(
        *h.log.borrow(),
        vec![
            RenderEvent::SurfaceResized {
                width: 2048,
                height: 1024
            },
            RenderEvent::OverlayResized {
                width: 1024.0,
                height: 512.0
            },
        ]
    );
    assert!((h.engine.scene().camera().aspect - 2.0).abs() < 1e-12);

    h.engine.handle_input(InputEvent::Resize {
        width: 0.0,
        height: 0.0,
        device_pixel_ratio: 1.0,
    });
    assert!((h.engine.scene().camera().aspect - 2.0).abs() < 1e-12);
    assert_eq!(h.engine.metrics().counter(RESIZES_SKIPPED), 1);

    h.host.set_size(300.0, 300.0);
    h.engine.on_host_resized();
    assert!((h.engine.scene().camera().aspect - 1.0).abs() < 1e-12);
}

fn body_map(h: &Harness) -> Option<gpu::resources::TextureId> {
    let scene = h.engine.scene();
    let drawable = scene.world().drawable_3d(scene.globe_body())?;
    scene.resources().material(drawable.material())?.map
}

#[test]
fn globe_body_always_has_a_texture() {
    for mode in [GlobeMode::Night, GlobeMode::Satellite] {
        let mut h = Harness::new(GlobeOptions::default().with_mode(mode));
        let fallback = h.engine.scene().fallback_texture();
        assert_eq!(body_map(&h), Some(fallback), "{mode:?}");

        for next in [GlobeMode::Satellite, GlobeMode::Night, GlobeMode::Satellite] {
            h.engine
                .update(GlobeUpdate {
                    mode: Some(next),
                    ..GlobeUpdate::default()
                })
                .unwrap();
            h.ticks(1);
            assert_eq!(body_map(&h), Some(fallback), "{mode:?} -> {next:?}");
        }
    }
}

#[test]
fn imagery_follows_mode_switches() {
    let url = "earth.png";
    let mut h = Harness::new(GlobeOptions::default().with_imagery(url, true));
    assert!(h.textures.resolve(url, png_bytes()));
    h.ticks(1);
    let bound = body_map(&h);
    assert!(bound.is_some());
    assert_ne!(bound, Some(h.engine.scene().fallback_texture()));

    h.engine
        .update(GlobeUpdate {
            mode: Some(GlobeMode::Satellite),
            ..GlobeUpdate::default()
        })
        .unwrap();
    assert_eq!(body_map(&h), bound);
}
