use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use openrr_bag::{Column, ExtractedSeries};
use tracing::debug;

use crate::Error;

const WINDOW_SIZE: [f32; 2] = [1000.0, 500.0];
const X_AXIS_LABEL: &str = "Time (seconds)";

/// Launches a window that plots `column` of `series` over time.
pub fn joint_state_plot(
    series: &ExtractedSeries,
    joint_name: &str,
    column: Column,
) -> Result<(), Error> {
    let app = JointStatePlot::new(series, joint_name, column);
    let title = app.title();
    debug!(%title, len = app.points.len(), "launching plot window");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(WINDOW_SIZE)
            .with_title(&title),
        ..Default::default()
    };
    eframe::run_native(&title, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| Error::Eframe(e.to_string()))
}

struct JointStatePlot {
    joint_name: String,
    column: Column,
    points: Vec<[f64; 2]>,
}

impl JointStatePlot {
    fn new(series: &ExtractedSeries, joint_name: &str, column: Column) -> Self {
        Self {
            joint_name: joint_name.to_owned(),
            column,
            points: series.points(column),
        }
    }

    fn title(&self) -> String {
        format!("{} of {} Over Time", self.column, self.joint_name)
    }

    fn legend(&self) -> String {
        format!("{} {}", self.joint_name, self.column)
    }

    fn y_axis_label(&self) -> String {
        match self.column {
            Column::Timestamp => format!("{} (seconds)", self.column),
            Column::Position | Column::Velocity => format!("{} (radians)", self.column),
        }
    }
}

impl eframe::App for JointStatePlot {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.title());
            if self.points.is_empty() {
                ui.label(format!("No record contains {}", self.joint_name));
            }
            Plot::new("joint_state_plot")
                .legend(Legend::default())
                .x_axis_label(X_AXIS_LABEL)
                .y_axis_label(self.y_axis_label())
                .show_grid(true)
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(PlotPoints::from(self.points.clone())).name(self.legend()),
                    );
                });
        });
    }
}
