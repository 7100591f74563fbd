use scene::{GlobeAnimation, GlobeScene, LayerKind, LightRig, MissingMap, Side, SphereLayer};
use streaming::{TextureCache, TextureHandle};
use tracing::trace;

use crate::camera::{Camera3D, Mat4, mat4_mul, mat4_rotation_y, mat4_uniform_scale};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceBinding {
    Mapped(TextureHandle),
    /// Tint only.
    Unmapped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Blend {
    Opaque,
    Alpha,
}

/// One shell, ready for the backend.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerDraw {
    pub kind: LayerKind,
    pub radius: f32,
    pub segments: u32,
    /// Unit sphere to world: spin about +Y, then scale to `radius`.
    pub model: Mat4,
    pub opacity: f32,
    pub side: Side,
    pub tint: [f32; 3],
    pub surface: SurfaceBinding,
    pub blend: Blend,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    Clear { color: [f32; 3] },
    Stars { count: u32 },
    DrawLayer(LayerDraw),
}

/// Shading inputs shared by every layer in a frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameLighting {
    /// Ambient intensity already multiplied by the environment tint.
    pub ambient: [f32; 3],
    pub light_dir: [f32; 3],
    pub directional_intensity: f32,
    pub point_position: [f32; 3],
    pub point_intensity: f32,
}

impl FrameLighting {
    pub fn from_rig(rig: &LightRig) -> Self {
        let tint = rig.environment.ambient_tint();
        Self {
            ambient: tint.map(|c| c * rig.ambient),
            light_dir: rig.light_dir().to_f32(),
            directional_intensity: rig.directional.intensity,
            point_position: rig.point.position.to_f32(),
            point_intensity: rig.point.intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub view_proj: Mat4,
    pub eye: [f32; 3],
    pub lighting: FrameLighting,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn layer_draws(&self) -> impl Iterator<Item = &LayerDraw> {
        self.commands.iter().filter_map(|cmd| match cmd {
            RenderCommand::DrawLayer(draw) => Some(draw),
            _ => None,
        })
    }
}

pub struct Renderer;

impl Renderer {
    /// Build one frame's command list: clear, stars, then each visible shell
    /// innermost first so translucent shells blend over what they enclose.
    pub fn collect(
        scene: &GlobeScene,
        anim: &GlobeAnimation,
        textures: &TextureCache,
        rig: &LightRig,
        camera: &Camera3D,
        aspect: f64,
    ) -> RenderFrame {
        let mut commands = Vec::with_capacity(scene.layers().len() + 2);
        commands.push(RenderCommand::Clear {
            color: rig.environment.backdrop(),
        });
        if rig.star_count > 0 {
            commands.push(RenderCommand::Stars {
                count: rig.star_count,
            });
        }

        let mut order: Vec<(usize, &SphereLayer)> = scene.layers().iter().enumerate().collect();
        order.sort_by(|a, b| a.1.radius.total_cmp(&b.1.radius));

        for (index, layer) in order {
            let Some(surface) = bind_surface(layer, textures) else {
                trace!(layer = layer.kind.name(), "layer hidden until its map loads");
                continue;
            };
            commands.push(RenderCommand::DrawLayer(LayerDraw {
                kind: layer.kind,
                radius: layer.radius as f32,
                segments: layer.segments,
                model: mat4_mul(
                    mat4_rotation_y(anim.rotation(index)),
                    mat4_uniform_scale(layer.radius as f32),
                ),
                opacity: layer.opacity,
                side: layer.side,
                tint: layer.tint,
                surface,
                blend: if layer.is_translucent() {
                    Blend::Alpha
                } else {
                    Blend::Opaque
                },
            }));
        }

        RenderFrame {
            view_proj: camera.view_proj(aspect),
            eye: camera.position.to_f32(),
            lighting: FrameLighting::from_rig(rig),
            commands,
        }
    }
}

fn bind_surface(layer: &SphereLayer, textures: &TextureCache) -> Option<SurfaceBinding> {
    let handle = layer.surface_uri.as_deref().and_then(|uri| textures.get(uri));
    match (handle, layer.missing_map) {
        (Some(handle), _) => Some(SurfaceBinding::Mapped(handle)),
        (None, MissingMap::Unmapped) => Some(SurfaceBinding::Unmapped),
        (None, MissingMap::Hidden) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Blend, RenderCommand, Renderer, SurfaceBinding};
    use crate::camera::{Camera3D, mat4_uniform_scale};
    use foundation::math::Vec3;
    use scene::{GlobeConfig, GlobeScene, LayerKind, LightRig};
    use streaming::{LoadStart, TextureCache};

    fn camera() -> Camera3D {
        Camera3D::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 0.8, 0.1, 1000.0)
    }

    fn png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn kinds(frame: &super::RenderFrame) -> Vec<LayerKind> {
        frame.layer_draws().map(|d| d.kind).collect()
    }

    #[test]
    fn clouds_stay_hidden_and_core_unmapped_until_maps_load() {
        let scene = GlobeScene::compose(&GlobeConfig::default()).unwrap();
        let anim = scene.animation();
        let cache = TextureCache::new();
        let frame = Renderer::collect(&scene, &anim, &cache, &LightRig::default(), &camera(), 1.0);

        assert_eq!(
            kinds(&frame),
            vec![
                LayerKind::Core,
                LayerKind::InnerAtmosphere,
                LayerKind::OuterAtmosphere
            ]
        );
        let core = frame.layer_draws().next().unwrap();
        assert_eq!(core.surface, SurfaceBinding::Unmapped);
        assert_eq!(core.blend, Blend::Opaque);
        assert!(matches!(frame.commands[0], RenderCommand::Clear { .. }));
        assert!(matches!(frame.commands[1], RenderCommand::Stars { count: 1200 }));
    }

    #[test]
    fn loaded_maps_are_bound_and_layers_draw_innermost_first() {
        let cfg = GlobeConfig::default();
        let scene = GlobeScene::compose(&cfg).unwrap();
        let mut cache = TextureCache::new();
        for uri in scene.texture_uris() {
            let LoadStart::Fetch(req) = cache.begin_load(uri) else {
                panic!("first load must fetch");
            };
            cache.finish_load(req, Ok(png())).unwrap();
        }

        let mut anim = scene.animation();
        scene.tick(&mut anim, 10.0);
        let frame = Renderer::collect(&scene, &anim, &cache, &LightRig::default(), &camera(), 1.0);

        assert_eq!(
            kinds(&frame),
            vec![
                LayerKind::Core,
                LayerKind::Clouds,
                LayerKind::InnerAtmosphere,
                LayerKind::OuterAtmosphere
            ]
        );
        let draws: Vec<_> = frame.layer_draws().collect();
        assert!(matches!(draws[0].surface, SurfaceBinding::Mapped(_)));
        assert!(matches!(draws[1].surface, SurfaceBinding::Mapped(_)));
        assert_eq!(draws[1].blend, Blend::Alpha);
        assert!(draws.windows(2).all(|w| w[0].radius < w[1].radius));
        assert_ne!(draws[0].model, mat4_uniform_scale(2.0));
        assert_eq!(draws[3].model, mat4_uniform_scale(2.25));
    }

    #[test]
    fn draw_order_does_not_depend_on_the_eye() {
        let scene = GlobeScene::compose(&GlobeConfig::default()).unwrap();
        let mut cache = TextureCache::new();
        for uri in scene.texture_uris() {
            if let LoadStart::Fetch(req) = cache.begin_load(uri) {
                cache.finish_load(req, Ok(png())).unwrap();
            }
        }
        let mut anim = scene.animation();
        scene.tick(&mut anim, 3.0);

        let eyes = [
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.1, 5.0, 0.0),
            Vec3::new(0.1, -5.0, 0.0),
            Vec3::new(3.0, 1.0, 3.0),
            // between the inner and outer atmosphere shells
            Vec3::new(0.0, 0.3, 2.2),
        ];
        for eye in eyes {
            let camera = Camera3D::look_at(eye, Vec3::ZERO, 0.8, 0.1, 1000.0);
            let frame =
                Renderer::collect(&scene, &anim, &cache, &LightRig::default(), &camera, 1.0);
            assert_eq!(
                kinds(&frame),
                vec![
                    LayerKind::Core,
                    LayerKind::Clouds,
                    LayerKind::InnerAtmosphere,
                    LayerKind::OuterAtmosphere
                ],
                "eye at {eye:?}"
            );
            let draws: Vec<_> = frame.layer_draws().collect();
            assert!(
                draws.windows(2).all(|w| w[0].radius <= w[1].radius),
                "eye at {eye:?}"
            );
        }
    }

    #[test]
    fn failed_map_falls_back_per_layer() {
        let scene = GlobeScene::compose(&GlobeConfig::default()).unwrap();
        let mut cache = TextureCache::new();
        for uri in scene.texture_uris() {
            if let LoadStart::Fetch(req) = cache.begin_load(uri) {
                assert!(cache.finish_load(req, Ok(b"not an image".to_vec())).is_none());
            }
        }
        let frame = Renderer::collect(
            &scene,
            &scene.animation(),
            &cache,
            &LightRig::default(),
            &camera(),
            1.0,
        );
        assert_eq!(frame.layer_draws().count(), 3);
    }
}
