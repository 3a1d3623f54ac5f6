//! Rendering capability probe using wgpu
//!
//! Creates the instance, surface, adapter and device for the avatar canvas.
//! Any failure along the way means the browser cannot show the 3D avatar and
//! is reported as [`CapabilityUnavailable`] so the host can swap in its
//! fallback presentation.

use wasm_bindgen::JsCast;

use crate::error::CapabilityUnavailable;
use crate::lighting::LightRig;

pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

fn unavailable(reason: impl std::fmt::Display) -> CapabilityUnavailable {
    CapabilityUnavailable(reason.to_string())
}

/// Look up the canvas element by id.
pub fn find_canvas(canvas_id: &str) -> Result<web_sys::HtmlCanvasElement, CapabilityUnavailable> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| unavailable("no document"))?;
    document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| unavailable(format!("canvas `{canvas_id}` not found")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| unavailable(format!("`{canvas_id}` is not a canvas")))
}

impl GpuContext {
    /// Initialize rendering on `canvas`, preferring WebGPU and falling back
    /// to WebGL2.
    pub async fn probe(canvas: web_sys::HtmlCanvasElement) -> Result<Self, CapabilityUnavailable> {
        let width = (canvas.client_width().max(1)) as u32;
        let height = (canvas.client_height().max(1)) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(unavailable)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(unavailable)?;
        log::info!("Using adapter {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Avatar Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(unavailable)?;

        let caps = surface.get_capabilities(&adapter);
        let format = *caps
            .formats
            .first()
            .ok_or_else(|| unavailable("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Clear the canvas with the current key light tint.
    pub fn render(&self, lights: &LightRig) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(_) => return, // Surface lost, skip frame
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let tint = lights.key.color * (0.08 + 0.04 * lights.key.intensity.min(2.0));
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Avatar Encoder"),
            });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(tint.x),
                            g: f64::from(tint.y),
                            b: f64::from(tint.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
