//! Unit price normalization.
//!
//! Items come in bottles of every size; the per-liter price is what makes them
//! comparable. Stored values are rounded to cents, ranking uses the raw ratio.
use crate::error::InvalidInput;
use crate::model::{CocktailCosts, CocktailIngredient};

const ML_PER_LITER: f64 = 1000.0;

/// Unrounded `price / (size_ml / 1000)`.
pub fn unit_price(price: f64, size_ml: f64) -> Result<f64, InvalidInput> {
    if !size_ml.is_finite() || size_ml <= 0.0 {
        return Err(InvalidInput(format!(
            "size must be a positive number of milliliters, got {size_ml}"
        )));
    }
    if !price.is_finite() {
        return Err(InvalidInput(format!("price must be finite, got {price}")));
    }
    Ok(price / (size_ml / ML_PER_LITER))
}

/// Per-liter price rounded to two decimal places, the value that gets stored.
pub fn compute_price_per_liter(price: f64, size_ml: f64) -> Result<f64, InvalidInput> {
    unit_price(price, size_ml).map(round2)
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Batch cost of a recipe, its share per serving and the price after
/// `profit_margin` percent markup. Zero servings leaves the batch cost unsplit.
pub fn cocktail_costs(
    ingredients: &[CocktailIngredient],
    profit_margin: f64,
    servings: u32,
) -> Result<CocktailCosts, InvalidInput> {
    if let Some(bad) = ingredients.iter().find(|i| !i.cost.is_finite()) {
        return Err(InvalidInput(format!(
            "cost of {} must be finite, got {}",
            bad.ingredient_name, bad.cost
        )));
    }
    if !profit_margin.is_finite() {
        return Err(InvalidInput(format!(
            "profit margin must be finite, got {profit_margin}"
        )));
    }

    let total_cost: f64 = ingredients.iter().map(|i| i.cost).sum();
    let cost_per_serving = if servings > 0 {
        total_cost / f64::from(servings)
    } else {
        total_cost
    };
    Ok(CocktailCosts {
        total_cost,
        cost_per_serving,
        selling_price: total_cost * (1.0 + profit_margin / 100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn seven_hundred_ml_bottle() {
        assert!(close(compute_price_per_liter(45.99, 700.0).unwrap(), 65.70));
        assert!(close(compute_price_per_liter(50.00, 700.0).unwrap(), 71.43));
    }

    #[test]
    fn one_liter_is_identity() {
        assert!(close(compute_price_per_liter(30.0, 1000.0).unwrap(), 30.0));
        assert!(close(compute_price_per_liter(0.0, 1000.0).unwrap(), 0.0));
    }

    #[test]
    fn rejects_zero_and_negative_size() {
        assert!(compute_price_per_liter(10.0, 0.0).is_err());
        assert!(compute_price_per_liter(10.0, -750.0).is_err());
        assert!(compute_price_per_liter(10.0, f64::NAN).is_err());
    }

    #[test]
    fn matches_rounded_ratio_across_sizes() {
        let prices: [f64; 7] = [0.0, 0.99, 9.5, 45.99, 65.99, 129.0, 1234.56];
        let sizes: [f64; 9] = [50.0, 330.0, 375.0, 500.0, 700.0, 750.0, 1000.0, 1125.0, 4500.0];
        for &p in &prices {
            for &s in &sizes {
                let expected = ((p / (s / 1000.0)) * 100.0).round() / 100.0;
                assert_eq!(compute_price_per_liter(p, s).unwrap(), expected, "p={p} s={s}");
            }
        }
    }

    fn line(name: &str, cost: f64) -> CocktailIngredient {
        CocktailIngredient {
            ingredient_id: name.to_lowercase(),
            ingredient_name: name.into(),
            amount: 30.0,
            unit: "ml".into(),
            cost,
        }
    }

    #[test]
    fn negroni_costs() {
        let recipe = [line("Gin", 2.10), line("Campari", 1.50), line("Vermouth", 0.90)];
        let costs = cocktail_costs(&recipe, 200.0, 2).unwrap();
        assert!(close(costs.total_cost, 4.50));
        assert!(close(costs.cost_per_serving, 2.25));
        assert!(close(costs.selling_price, 13.50));
    }

    #[test]
    fn zero_servings_keeps_batch_cost() {
        let recipe = [line("Gin", 3.0), line("Tonic", 1.0)];
        let costs = cocktail_costs(&recipe, 0.0, 0).unwrap();
        assert!(close(costs.cost_per_serving, 4.0));
        assert!(close(costs.selling_price, 4.0));
    }

    #[test]
    fn empty_recipe_costs_nothing() {
        assert_eq!(cocktail_costs(&[], 50.0, 1).unwrap(), CocktailCosts::default());
    }

    #[test]
    fn cocktail_costs_reject_non_finite_input() {
        let err = cocktail_costs(&[line("Gin", f64::NAN)], 10.0, 1).unwrap_err();
        assert!(err.0.contains("Gin"));
        assert!(cocktail_costs(&[line("Gin", 1.0)], f64::INFINITY, 1).is_err());
    }

    #[test]
    fn unit_price_is_unrounded() {
        let raw = unit_price(50.0, 700.0).unwrap();
        assert!(raw > 71.428 && raw < 71.429);
    }
}
