//! Derivative-free simplex minimisation used to estimate model coefficients.

use crate::forecast::ForecastError;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Nelder–Mead settings.
#[derive(Debug, Clone)]
pub(crate) struct NelderMead {
    pub max_iterations: usize,
    /// Relative spread of the simplex values at which the search stops
    pub value_tolerance: f64,
    /// Largest coordinate distance from the best vertex at which the search stops
    pub point_tolerance: f64,
    /// Offset of the initial simplex vertices from the start point
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        NelderMead {
            max_iterations: 5000,
            value_tolerance: 1e-10,
            point_tolerance: 1e-6,
            initial_step: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

impl NelderMead {
    /// Minimises `objective` starting from `start`. Non-finite objective values
    /// are treated as +infinity.
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum, ForecastError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |point: &[f64]| {
            let value = objective(point);
            if value.is_finite() {
                value
            } else {
                f64::INFINITY
            }
        };

        if start.is_empty() {
            return Ok(Minimum {
                point: Vec::new(),
                value: eval(start),
                iterations: 0,
            });
        }

        let mut simplex: Vec<Vertex> = Vec::with_capacity(start.len() + 1);
        simplex.push(Vertex {
            point: start.to_vec(),
            value: eval(start),
        });
        for axis in 0..start.len() {
            let mut point = start.to_vec();
            point[axis] += self.initial_step;
            let value = eval(&point);
            simplex.push(Vertex { point, value });
        }

        for iteration in 0..self.max_iterations {
            simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
            if self.has_converged(&simplex) {
                return Ok(best_of(simplex, iteration));
            }
            self.step(&mut simplex, &eval);
        }

        simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
        if self.has_converged(&simplex) {
            return Ok(best_of(simplex, self.max_iterations));
        }
        Err(ForecastError::NotConverged {
            iterations: self.max_iterations,
        })
    }

    fn has_converged(&self, simplex: &[Vertex]) -> bool {
        let best = &simplex[0];
        let worst = &simplex[simplex.len() - 1];
        if !best.value.is_finite() {
            return false;
        }

        let value_spread = (worst.value - best.value).abs();
        let value_ok =
            value_spread <= self.value_tolerance * (best.value.abs() + worst.value.abs()) + 1e-12;

        let point_spread = simplex[1..]
            .iter()
            .flat_map(|vertex| {
                vertex
                    .point
                    .iter()
                    .zip(&best.point)
                    .map(|(x, b)| (x - b).abs())
            })
            .fold(0.0, f64::max);

        value_ok && point_spread <= self.point_tolerance
    }

    /// One reflection/expansion/contraction/shrink step on a sorted simplex.
    fn step<F>(&self, simplex: &mut [Vertex], eval: &F)
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = simplex.len() - 1;
        let dims = simplex[0].point.len();

        let mut centroid = vec![0.0; dims];
        for vertex in &simplex[..n] {
            for (c, x) in centroid.iter_mut().zip(&vertex.point) {
                *c += x / n as f64;
            }
        }

        let toward = |from: &[f64], coefficient: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coefficient * (x - c))
                .collect()
        };

        let worst_point = simplex[n].point.clone();
        let reflected = toward(&worst_point, -REFLECTION);
        let reflected_value = eval(&reflected);

        if reflected_value < simplex[0].value {
            let expanded = toward(&reflected, EXPANSION);
            let expanded_value = eval(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                Vertex {
                    point: expanded,
                    value: expanded_value,
                }
            } else {
                Vertex {
                    point: reflected,
                    value: reflected_value,
                }
            };
            return;
        }

        if reflected_value < simplex[n - 1].value {
            simplex[n] = Vertex {
                point: reflected,
                value: reflected_value,
            };
            return;
        }

        let (contracted, limit) = if reflected_value < simplex[n].value {
            (toward(&reflected, CONTRACTION), reflected_value)
        } else {
            (toward(&worst_point, CONTRACTION), simplex[n].value)
        };
        let contracted_value = eval(&contracted);
        if contracted_value < limit {
            simplex[n] = Vertex {
                point: contracted,
                value: contracted_value,
            };
            return;
        }

        let best_point = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            vertex.point = best_point
                .iter()
                .zip(&vertex.point)
                .map(|(b, x)| b + SHRINK * (x - b))
                .collect();
            vertex.value = eval(&vertex.point);
        }
    }
}

fn best_of(simplex: Vec<Vertex>, iterations: usize) -> Minimum {
    let best = simplex.into_iter().next();
    match best {
        Some(vertex) => Minimum {
            point: vertex.point,
            value: vertex.value,
            iterations,
        },
        None => Minimum {
            point: Vec::new(),
            value: f64::INFINITY,
            iterations,
        },
    }
}
