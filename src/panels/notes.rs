use std::sync::Arc;

use winit::dpi::LogicalSize;
use winit::window::{Window, WindowAttributes, WindowId};

use super::{panel_frame, PanelWindow};
use crate::error::RenderError;
use crate::notes::NoteStore;
use crate::render::GpuContext;

/// Note editor and list. Lives until its window is closed.
pub struct NotesPanel {
    host: PanelWindow,
    store: NoteStore,
    draft: String,
}

impl NotesPanel {
    pub fn attributes() -> WindowAttributes {
        WindowAttributes::default()
            .with_title("Notes")
            .with_inner_size(LogicalSize::new(320.0, 420.0))
            .with_min_inner_size(LogicalSize::new(240.0, 200.0))
    }

    pub fn new(gpu: &GpuContext, window: Arc<Window>, store: NoteStore) -> Result<Self, RenderError> {
        let host = PanelWindow::new(gpu, window)?;
        host.window().request_redraw();
        log::info!(
            "Notes open ({} stored in {})",
            store.notes().len(),
            store.path().display()
        );
        Ok(Self {
            host,
            store,
            draft: String::new(),
        })
    }

    pub fn id(&self) -> WindowId {
        self.host.id()
    }

    pub fn host(&mut self) -> &mut PanelWindow {
        &mut self.host
    }

    pub fn focus(&self) {
        self.host.window().focus_window();
    }

    pub fn redraw(&mut self, gpu: &GpuContext) {
        self.host
            .redraw(gpu, |ctx| draw_ui(ctx, &mut self.store, &mut self.draft));
    }

    /// Save and hand the store back.
    pub fn close(self) -> NoteStore {
        if let Err(e) = self.store.save() {
            log::error!("Could not save notes to {}: {e}", self.store.path().display());
        }
        self.store
    }
}

fn draw_ui(ctx: &egui::Context, store: &mut NoteStore, draft: &mut String) {
    egui::CentralPanel::default()
        .frame(panel_frame())
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            ui.add(
                egui::TextEdit::multiline(draft)
                    .hint_text("Write a note...")
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
            if ui.button("Add").clicked() && store.add(draft) {
                draft.clear();
            }
            ui.separator();

            let mut delete = None;
            egui::ScrollArea::vertical().show(ui, |ui| {
                if store.notes().is_empty() {
                    ui.weak("No notes yet");
                }
                for (i, note) in store.notes().iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(note.formatted_time()).small().weak());
                        if ui.small_button("Delete").clicked() {
                            delete = Some(i);
                        }
                    });
                    ui.label(&note.content);
                    ui.add_space(6.0);
                }
            });

            if let Some(i) = delete {
                store.remove(i);
            }
        });
}
