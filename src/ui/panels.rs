use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::lighting::LightingRig;
use crate::params::BoundaryCondition;
use crate::pipeline::StatusLine;
use crate::scene::{MaterialKind, RenderMode};
use crate::ui::state::UiState;
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub params_changed: bool,
    pub render_mode: Option<RenderMode>,
    pub material_kind: Option<MaterialKind>,
    pub front_color: Option<[f32; 3]>,
    pub back_color: Option<[f32; 3]>,
    pub lighting_changed: bool,
    pub export_snapshot: bool,
    pub import_snapshot: bool,
    pub acknowledge_status: bool,
}

pub fn draw_side_panel(
    ctx: &Context,
    state: &mut UiState,
    rig: &mut LightingRig,
    status: Option<&StatusLine>,
    fetch_error: &Option<String>,
    is_fetching: bool,
) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(320.0)
        .max_width(400.0)
        .default_width(340.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Chladni 3D").strong());
                ui.add_space(4.0);
                ui.label(
                    RichText::new("Standing wave pattern explorer")
                        .color(TEXT_MUTED)
                        .size(11.0),
                );
                ui.add_space(16.0);

                status_frame(ui, &mut actions, status, fetch_error, is_fetching);

                section_header(ui, "COEFFICIENTS");
                coefficient_rows(ui, state, &mut actions);
                ui.add_space(16.0);

                section_header(ui, "MODE NUMBERS");
                mode_number_rows(ui, state, &mut actions);
                ui.add_space(16.0);

                section_header(ui, "DOMAIN");
                bounds_rows(ui, state, &mut actions);
                ui.add_space(16.0);

                section_header(ui, "BOUNDARY");
                ui.horizontal(|ui| {
                    for bc in [BoundaryCondition::Dirichlet, BoundaryCondition::Neumann] {
                        let label = match bc {
                            BoundaryCondition::Dirichlet => "Dirichlet (sin)",
                            BoundaryCondition::Neumann => "Neumann (cos)",
                        };
                        if ui
                            .selectable_label(state.params.boundary == bc, label)
                            .clicked()
                            && state.params.boundary != bc
                        {
                            state.params.boundary = bc;
                            actions.params_changed = true;
                        }
                    }
                });
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "DISPLAY");
                display_controls(ui, state, &mut actions);
                ui.add_space(16.0);

                section_header(ui, "LIGHTING");
                lighting_controls(ui, rig, &mut actions);
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "PATTERN FILE");
                ui.horizontal(|ui| {
                    if ui
                        .add(
                            egui::Button::new(RichText::new("Export").color(BG_PANEL))
                                .fill(ACCENT_TEAL)
                                .min_size(egui::vec2(80.0, 28.0)),
                        )
                        .clicked()
                    {
                        actions.export_snapshot = true;
                    }
                    if ui
                        .add(egui::Button::new("Import").min_size(egui::vec2(80.0, 28.0)))
                        .clicked()
                    {
                        actions.import_snapshot = true;
                    }
                });
                ui.add_space(16.0);

                ui.checkbox(&mut state.vsync_enabled, "VSync");
                ui.checkbox(&mut state.show_help, "Show controls hint");
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

/// Numeric field plus a matching range slider over the same value; edits
/// through either route count as a parameter change.
fn scalar_row(
    ui: &mut Ui,
    label: &str,
    value: &mut f64,
    range: std::ops::RangeInclusive<f64>,
    speed: f64,
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(RichText::new(label).monospace());
        changed |= ui.add(egui::DragValue::new(value).speed(speed)).changed();
        changed |= ui
            .add(egui::Slider::new(value, range).show_value(false))
            .changed();
    });
    changed
}

fn mode_row(ui: &mut Ui, label: &str, value: &mut i32) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(RichText::new(label).monospace());
        changed |= ui
            .add(egui::DragValue::new(value).speed(1.0).range(1..=20))
            .changed();
        changed |= ui
            .add(egui::Slider::new(value, 1..=20).show_value(false))
            .changed();
    });
    changed
}

fn coefficient_rows(ui: &mut Ui, state: &mut UiState, actions: &mut UiActions) {
    let params = &mut state.params;
    for (label, value) in [
        ("A", &mut params.a),
        ("B", &mut params.b),
        ("C", &mut params.c),
        ("D", &mut params.d),
        ("E", &mut params.e),
        ("F", &mut params.f),
    ] {
        actions.params_changed |= scalar_row(ui, label, value, -5.0..=5.0, 0.05);
    }
}

fn mode_number_rows(ui: &mut Ui, state: &mut UiState, actions: &mut UiActions) {
    let params = &mut state.params;
    for (label, value) in [
        ("u", &mut params.u),
        ("v", &mut params.v),
        ("w", &mut params.w),
    ] {
        actions.params_changed |= mode_row(ui, label, value);
    }
}

fn bounds_rows(ui: &mut Ui, state: &mut UiState, actions: &mut UiActions) {
    let params = &mut state.params;
    for (label, value) in [
        ("X min", &mut params.min_x),
        ("X max", &mut params.max_x),
        ("Y min", &mut params.min_y),
        ("Y max", &mut params.max_y),
        ("Z min", &mut params.min_z),
        ("Z max", &mut params.max_z),
    ] {
        actions.params_changed |= scalar_row(ui, label, value, -10.0..=10.0, 0.1);
    }
}

fn display_controls(ui: &mut Ui, state: &mut UiState, actions: &mut UiActions) {
    ui.horizontal(|ui| {
        ui.label("Render:");
        for (mode, label) in [
            (RenderMode::Single, "Single mesh"),
            (RenderMode::Double, "Front / back"),
        ] {
            if ui
                .selectable_label(state.render_mode == mode, label)
                .clicked()
                && state.render_mode != mode
            {
                state.render_mode = mode;
                actions.render_mode = Some(mode);
            }
        }
    });
    ui.add_space(4.0);

    ui.horizontal(|ui| {
        ui.label("Material:");
        egui::ComboBox::from_id_salt("material_kind")
            .selected_text(state.material.kind.label())
            .show_ui(ui, |ui| {
                for kind in MaterialKind::ALL {
                    if ui
                        .selectable_label(state.material.kind == kind, kind.label())
                        .clicked()
                        && state.material.kind != kind
                    {
                        state.material.kind = kind;
                        actions.material_kind = Some(kind);
                    }
                }
            });
    });
    ui.add_space(4.0);

    ui.horizontal(|ui| {
        ui.label("Front color:");
        if ui
            .color_edit_button_rgb(&mut state.material.front_color)
            .changed()
        {
            actions.front_color = Some(state.material.front_color);
        }
    });
    if state.render_mode == RenderMode::Double {
        ui.horizontal(|ui| {
            ui.label("Back color:");
            if ui
                .color_edit_button_rgb(&mut state.material.back_color)
                .changed()
            {
                actions.back_color = Some(state.material.back_color);
            }
        });
    }
    ui.horizontal(|ui| {
        ui.label("Background:");
        ui.color_edit_button_rgb(&mut state.background);
    });
}

fn lighting_controls(ui: &mut Ui, rig: &mut LightingRig, actions: &mut UiActions) {
    let mut selected = rig.preset();
    egui::ComboBox::from_id_salt("light_preset")
        .selected_text(selected.label())
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for preset in crate::lighting::LightPreset::ALL {
                if ui
                    .selectable_label(selected == preset, preset.label())
                    .clicked()
                {
                    selected = preset;
                }
            }
        });
    if selected != rig.preset() {
        rig.set_preset(selected);
        actions.lighting_changed = true;
    }
    ui.add_space(4.0);

    for light in rig.lights_mut() {
        ui.horizontal(|ui| {
            ui.label(light.label());
            if ui
                .add(egui::Slider::new(light.intensity_mut(), 0.0..=5.0))
                .changed()
            {
                actions.lighting_changed = true;
            }
        });
    }
}

fn status_frame(
    ui: &mut Ui,
    actions: &mut UiActions,
    status: Option<&StatusLine>,
    fetch_error: &Option<String>,
    is_fetching: bool,
) {
    if is_fetching {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new("Generating pattern...").color(TEXT_MUTED));
        });
        ui.add_space(8.0);
    }

    if let Some(line) = status {
        let (fill, stroke) = if line.blocking {
            (Color32::from_rgb(45, 32, 12), ACCENT_AMBER)
        } else {
            (BG_WIDGET, BORDER_SUBTLE)
        };
        egui::Frame::default()
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, stroke))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&line.message).size(11.0));
                if line.blocking && ui.button("Dismiss").clicked() {
                    actions.acknowledge_status = true;
                }
            });
        ui.add_space(8.0);
    }

    if let Some(err) = fetch_error {
        egui::Frame::default()
            .fill(Color32::from_rgb(42, 16, 16))
            .stroke(egui::Stroke::new(1.0, ACCENT_RED))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("Pattern generation failed: {err}"))
                        .color(ACCENT_RED)
                        .size(11.0),
                );
            });
        ui.add_space(8.0);
    }
}

pub fn draw_help_overlay(ctx: &Context) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id =
                        Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(
                        RichText::new("Drag - Orbit | Scroll - Zoom").color(TEXT_MUTED),
                    );
                });
        });
}
