use std::fmt::Write;

use quarry_core::{Decision, Dummy, ReplacementPlan, TransportSolution};

/// Quantities below this are left out of listings
const DISPLAY_EPSILON: f64 = 0.001;

pub fn transport(solution: &TransportSolution) -> String {
    let mut out = String::new();
    let balanced = &solution.balanced;

    let _ = writeln!(out, "Status: {}", solution.status.to_string().to_uppercase());
    if !solution.is_optimal() {
        return out;
    }

    let _ = writeln!(out, "Total cost: {:.2}", solution.total_cost);
    let _ = writeln!(out, "Total supply: {:.2}", solution.total_supply);
    let _ = writeln!(out, "Total demand: {:.2}", solution.total_demand);
    match balanced.dummy {
        Some(Dummy::Consumer) => {
            let surplus = balanced.demand[balanced.real_consumers];
            let _ = writeln!(out, "Balanced with a dummy consumer absorbing {:.2}", surplus);
        }
        Some(Dummy::Supplier) => {
            let deficit = balanced.supply[balanced.real_suppliers];
            let _ = writeln!(out, "Balanced with a dummy supplier covering {:.2}", deficit);
        }
        None => {}
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Shipments:");
    let _ = write!(out, "  {:20}", "");
    for name in &balanced.demand_names[..balanced.real_consumers] {
        let _ = write!(out, " {:>12}", name);
    }
    let _ = writeln!(out);
    for (name, row) in balanced.supply_names.iter().zip(solution.shipments()) {
        let _ = write!(out, "  {:20}", name);
        for flow in row {
            let _ = write!(out, " {:>12.2}", flow);
        }
        let _ = writeln!(out);
    }

    let deliveries = solution.deliveries();
    if !deliveries.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Deliveries:");
        for d in &deliveries {
            let _ = writeln!(
                out,
                "  {:20} -> {:20} {:10.2} x {:8.2} = {:12.2}",
                d.supplier, d.consumer, d.quantity, d.unit_cost, d.cost
            );
        }
    }

    let unshipped: Vec<_> = balanced
        .supply_names
        .iter()
        .zip(solution.unshipped_supply())
        .filter(|(_, amount)| *amount > DISPLAY_EPSILON)
        .collect();
    if !unshipped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Unshipped supply:");
        for (name, amount) in unshipped {
            let _ = writeln!(out, "  {:20} {:10.2}", name, amount);
        }
    }

    let unmet: Vec<_> = balanced
        .demand_names
        .iter()
        .zip(solution.unmet_demand())
        .filter(|(_, amount)| *amount > DISPLAY_EPSILON)
        .collect();
    if !unmet.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Unmet demand:");
        for (name, amount) in unmet {
            let _ = writeln!(out, "  {:20} {:10.2}", name, amount);
        }
    }

    out
}

pub fn replacement(plan: &ReplacementPlan, show_table: bool) -> String {
    let mut out = String::new();
    let table = &plan.table;

    let _ = writeln!(out, "Horizon: {} years, max age {}", table.horizon(), table.max_age());
    let _ = writeln!(out);
    let _ = writeln!(out, "Strategy:");
    let _ = writeln!(
        out,
        "  {:>4} {:>4}  {:8} {:>10} {:>10} {:>10}",
        "Year", "Age", "Decision", "Keep", "Replace", "Annual"
    );
    for step in &plan.strategy {
        let keep = step
            .profit_if_keep
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:>4} {:>4}  {:8} {:>10} {:>10.2} {:>10.2}",
            step.year, step.age, step.decision, keep, step.profit_if_replace, step.annual_profit
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Total profit over {} years: {:.2}", plan.strategy.len(), plan.total_profit);

    if show_table {
        let _ = writeln!(out);
        let _ = writeln!(out, "Value table (R = replace):");
        let _ = write!(out, "  {:>4}", "Year");
        for age in 1..=table.max_age() {
            let _ = write!(out, " {:>10}", format!("age {}", age));
        }
        let _ = writeln!(out);
        for year in (1..=table.horizon()).rev() {
            let _ = write!(out, "  {:>4}", year);
            for cell in table.year(year) {
                let marker = if cell.decision == Decision::Replace { "R" } else { " " };
                let _ = write!(out, " {:>9.2}{}", cell.value, marker);
            }
            let _ = writeln!(out);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{replacement as plan, transport as ship};

    #[test]
    fn test_transport_report_lists_real_lanes_only() {
        let solution = ship::solve(
            vec![vec![2.0], vec![3.0]],
            vec![30.0, 20.0],
            vec![40.0],
            vec!["North pit".to_string(), "South pit".to_string()],
            vec!["Plant".to_string()],
        )
        .unwrap();
        let text = transport(&solution);

        assert!(text.starts_with("Status: OPTIMAL"));
        assert!(text.contains("Total cost: 90.00"));
        assert!(text.contains("dummy consumer absorbing 10.00"));
        assert!(text.contains("Unshipped supply:"));
        assert!(!text.contains("Dummy consumer"));
        assert!(!text.contains("Unmet demand:"));
    }

    #[test]
    fn test_replacement_report() {
        let result = plan::solve(vec![5.0, 4.0, 3.0], vec![4.0, 3.0, 2.0], 2.0, 2).unwrap();
        let text = replacement(&result, true);

        assert!(text.contains("Total profit over 2 years: 12.00"));
        assert!(text.contains("replace"));
        assert!(text.contains("Value table"));
    }
}
