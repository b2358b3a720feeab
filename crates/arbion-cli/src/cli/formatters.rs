// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.

//! Output formatters for schedule inspection.

use arbion_core::OpportunityCosts;
use arbion_types::Schedule;
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};

/// One period of an inspected forecast
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRow {
    pub label: String,
    pub price: f64,
    pub charge: f64,
    pub discharge: f64,
    /// Stored energy at the end of the period
    pub soc: f64,
    pub charge_cost: Option<f64>,
    pub discharge_cost: Option<f64>,
}

impl InspectionRow {
    /// Zip period labels, prices, schedule and (optional) costs into rows
    pub fn collect(
        labels: &[String],
        prices: &[f64],
        schedule: &Schedule,
        costs: Option<&OpportunityCosts>,
        efficiency: f64,
    ) -> Vec<Self> {
        let soc = schedule.soc_trajectory(efficiency);
        labels
            .iter()
            .zip(prices)
            .enumerate()
            .map(|(t, (label, &price))| Self {
                label: label.clone(),
                price,
                charge: schedule.charge.get(t).copied().unwrap_or_default(),
                discharge: schedule.discharge.get(t).copied().unwrap_or_default(),
                soc: soc.get(t + 1).copied().unwrap_or_default(),
                charge_cost: costs.and_then(|c| c.charge.get(t).copied()),
                discharge_cost: costs.and_then(|c| c.discharge.get(t).copied()),
            })
            .collect()
    }
}

/// Formatter for pretty ASCII tables
#[derive(Debug)]
pub struct TableFormatter;

impl TableFormatter {
    /// Format inspected periods as a table followed by a short summary
    pub fn format_inspection(rows: &[InspectionRow], profit: f64) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Period").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold),
            Cell::new("Charge\n(MW)").add_attribute(Attribute::Bold),
            Cell::new("Discharge\n(MW)").add_attribute(Attribute::Bold),
            Cell::new("SoC\n(MWh)").add_attribute(Attribute::Bold),
            Cell::new("Charge\ncost").add_attribute(Attribute::Bold),
            Cell::new("Discharge\ncost").add_attribute(Attribute::Bold),
        ]);

        for row in rows {
            let activity = if row.charge > 0.0 {
                Some(Color::Cyan)
            } else if row.discharge > 0.0 {
                Some(Color::Green)
            } else {
                None
            };
            let label = match activity {
                Some(color) => Cell::new(&row.label).fg(color),
                None => Cell::new(&row.label),
            };

            table.add_row(vec![
                label,
                Cell::new(format!("{:.2}", row.price)),
                Cell::new(format!("{:.2}", row.charge)),
                Cell::new(format!("{:.2}", row.discharge)),
                Cell::new(format!("{:.2}", row.soc)),
                Cell::new(format_cost(row.charge_cost)),
                Cell::new(format_cost(row.discharge_cost)),
            ]);
        }

        let charged: f64 = rows.iter().map(|r| r.charge).sum();
        let discharged: f64 = rows.iter().map(|r| r.discharge).sum();

        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "{} periods | charged {charged:.2} MW | discharged {discharged:.2} MW | profit {profit:.2}\n",
            rows.len()
        ));
        output
    }
}

fn format_cost(cost: Option<f64>) -> String {
    cost.map_or_else(|| "-".to_owned(), |c| format!("{c:.2}"))
}
