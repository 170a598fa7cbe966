use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, MouseEvent, Window};

use crate::agent::Viewport;
use crate::config::FlockVariant;
use crate::error::HostError;
use crate::render::{css_transform, SPRITE_TRANSFORM};
use crate::Sim;

const FOREGROUND_SELECTOR: &str = ".fish";
const BACKGROUND_SELECTOR: &str = ".background-fish";
const WRAPPER_SELECTOR: &str = ".fish-wrapper";
const POINTER_EVENT: &str = "mousemove";

type FrameCallback = Closure<dyn FnMut(f64)>;
type PointerCallback = Closure<dyn FnMut(MouseEvent)>;
type SharedFlocks = Rc<RefCell<Vec<FlockBinding>>>;

struct FlockBinding {
    sim: Sim,
    elements: Vec<HtmlElement>,
}

impl FlockBinding {
    fn mount(
        document: &Document,
        selector: &str,
        variant: FlockVariant,
        viewport: Viewport,
        now_ms: f64,
    ) -> Result<Self, HostError> {
        let nodes = document
            .query_selector_all(selector)
            .map_err(|err| HostError::Selector {
                selector: selector.to_string(),
                message: format!("{err:?}"),
            })?;

        let mut elements = Vec::with_capacity(nodes.length() as usize);
        for i in 0..nodes.length() {
            if let Some(element) = nodes
                .get(i)
                .and_then(|node| node.dyn_into::<HtmlElement>().ok())
            {
                elements.push(element);
            }
        }

        for element in &elements {
            let wrapper = element
                .query_selector(WRAPPER_SELECTOR)
                .ok()
                .flatten()
                .and_then(|wrapper| wrapper.dyn_into::<HtmlElement>().ok());
            if let Some(wrapper) = wrapper {
                wrapper
                    .style()
                    .set_property("transform", SPRITE_TRANSFORM)
                    .map_err(js_error)?;
            }
        }

        let sim = Sim::new(
            elements.len(),
            None,
            viewport.width,
            viewport.height,
            variant.as_u32(),
            now_ms,
        );
        let binding = Self { sim, elements };
        binding.render()?;
        Ok(binding)
    }

    fn render(&self) -> Result<(), HostError> {
        for (element, pose) in self.elements.iter().zip(self.sim.flock().poses()) {
            element
                .style()
                .set_property("transform", &css_transform(pose))
                .map_err(js_error)?;
        }
        Ok(())
    }
}

#[wasm_bindgen]
pub struct AquariumHandle {
    window: Window,
    document: Document,
    flocks: SharedFlocks,
    frame: Rc<RefCell<Option<FrameCallback>>>,
    frame_id: Rc<Cell<Option<i32>>>,
    pointer_listener: Option<PointerCallback>,
    disposed: bool,
}

#[wasm_bindgen]
impl AquariumHandle {
    pub fn dispose(&mut self) {
        self.teardown();
    }

    #[wasm_bindgen(js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[wasm_bindgen(js_name = fishCount)]
    pub fn fish_count(&self) -> usize {
        self.flocks
            .try_borrow()
            .map(|flocks| flocks.iter().map(|binding| binding.sim.count()).sum())
            .unwrap_or(0)
    }
}

impl AquariumHandle {
    fn start_frames(&mut self) -> Result<(), HostError> {
        let window = self.window.clone();
        let flocks = Rc::clone(&self.flocks);
        let frame = Rc::clone(&self.frame);
        let frame_id = Rc::clone(&self.frame_id);

        let callback = FrameCallback::new(move |now_ms: f64| {
            let viewport = viewport_of(&window);
            if let Ok(mut flocks) = flocks.try_borrow_mut() {
                for binding in flocks.iter_mut() {
                    binding.sim.set_bounds(viewport.width, viewport.height);
                    binding.sim.tick(now_ms);
                    if let Err(err) = binding.render() {
                        warn!(%err, "failed to render flock");
                    }
                }
            }

            if let Some(next) = frame.borrow().as_ref() {
                match window.request_animation_frame(next.as_ref().unchecked_ref()) {
                    Ok(id) => frame_id.set(Some(id)),
                    Err(err) => {
                        warn!(err = ?err, "failed to schedule next frame");
                        frame_id.set(None);
                    }
                }
            }
        });

        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.frame_id.set(Some(id));
        *self.frame.borrow_mut() = Some(callback);
        Ok(())
    }

    fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(id) = self.frame_id.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                warn!(err = ?err, "failed to cancel animation frame");
            }
        }
        // Breaks the closure's reference to itself.
        self.frame.borrow_mut().take();

        if let Some(listener) = self.pointer_listener.take() {
            if let Err(err) = self
                .document
                .remove_event_listener_with_callback(POINTER_EVENT, listener.as_ref().unchecked_ref())
            {
                warn!(err = ?err, "failed to remove pointer listener");
            }
        }

        if let Ok(mut flocks) = self.flocks.try_borrow_mut() {
            for binding in flocks.iter_mut() {
                binding.sim.dispose();
            }
            flocks.clear();
        }
        info!("aquarium disposed");
    }
}

impl Drop for AquariumHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Mounts the page layout: ambient fish behind, pointer-following fish in front.
#[wasm_bindgen(js_name = mountAquarium)]
pub fn mount_aquarium() -> Result<AquariumHandle, JsError> {
    Ok(mount(&[
        (BACKGROUND_SELECTOR, FlockVariant::Ambient),
        (FOREGROUND_SELECTOR, FlockVariant::Interactive),
    ])?)
}

#[wasm_bindgen(js_name = mountFlock)]
pub fn mount_flock(selector: &str, variant: u32) -> Result<AquariumHandle, JsError> {
    Ok(mount(&[(selector, FlockVariant::from_u32(variant))])?)
}

fn mount(layout: &[(&str, FlockVariant)]) -> Result<AquariumHandle, HostError> {
    let window = web_sys::window().ok_or(HostError::NoWindow)?;
    let document = window.document().ok_or(HostError::NoDocument)?;
    let started_ms = now_ms(&window);
    let viewport = viewport_of(&window);

    let bindings = layout
        .iter()
        .map(|(selector, variant)| {
            FlockBinding::mount(&document, selector, *variant, viewport, started_ms)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let flocks: SharedFlocks = Rc::new(RefCell::new(bindings));

    let pointer_listener = if layout
        .iter()
        .any(|(_, variant)| *variant == FlockVariant::Interactive)
    {
        Some(listen_pointer(&window, &document, Rc::clone(&flocks))?)
    } else {
        None
    };

    let mut handle = AquariumHandle {
        window,
        document,
        flocks,
        frame: Rc::new(RefCell::new(None)),
        frame_id: Rc::new(Cell::new(None)),
        pointer_listener,
        disposed: false,
    };
    handle.start_frames()?;

    info!(
        flocks = layout.len(),
        fish = handle.fish_count(),
        "aquarium mounted"
    );
    Ok(handle)
}

fn listen_pointer(
    window: &Window,
    document: &Document,
    flocks: SharedFlocks,
) -> Result<PointerCallback, HostError> {
    let window = window.clone();
    let listener = PointerCallback::new(move |event: MouseEvent| {
        let now_ms = now_ms(&window);
        let x = event.client_x() as f32;
        let y = event.client_y() as f32;
        if let Ok(mut flocks) = flocks.try_borrow_mut() {
            for binding in flocks.iter_mut() {
                binding.sim.set_pointer(x, y, now_ms);
            }
        }
    });

    document
        .add_event_listener_with_callback(POINTER_EVENT, listener.as_ref().unchecked_ref())
        .map_err(js_error)?;
    Ok(listener)
}

fn viewport_of(window: &Window) -> Viewport {
    let width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    Viewport::new(width as f32, height as f32)
}

fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|performance| performance.now())
        .unwrap_or(0.0)
}

fn js_error(err: JsValue) -> HostError {
    HostError::Js(format!("{err:?}"))
}
