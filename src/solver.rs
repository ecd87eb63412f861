/**
 * RateRec
 * Copyright (C) 2026 The RateRec authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

extern crate ndarray;
extern crate sprs;

use ndarray::Array1;
use sprs::CsMat;

use types::DenseVector;

/// Damped least squares via the LSQR algorithm of Paige & Saunders.
///
/// Minimizes ||Ax - b||² + damp²·||x||² over a compressed sparse matrix,
/// using Golub-Kahan bidiagonalization and plane rotations. With zero
/// damping this converges to the minimum-norm least-squares solution, which
/// makes it usable for rank-deficient one-hot design matrices as well.
/// The computation is fully deterministic for fixed inputs.
pub fn lsqr(
    a: &CsMat<f64>,
    b: &DenseVector,
    damp: f64,
    max_iterations: usize,
    tolerance: f64,
) -> DenseVector {

    debug_assert!(a.is_csr());
    debug_assert_eq!(a.rows(), b.len());

    let num_columns = a.cols();
    let mut x = Array1::zeros(num_columns);

    let b_norm = norm(b);
    if b_norm == 0.0 {
        return x;
    }

    let mut u = b.clone();
    u /= b_norm;
    let mut beta = b_norm;

    let mut v = transposed_times_vector(a, &u);
    let mut alpha = norm(&v);
    if alpha == 0.0 {
        return x;
    }
    v /= alpha;

    let mut w = v.clone();
    let mut phi_bar = beta;
    let mut rho_bar = alpha;

    for _ in 0..max_iterations {

        // Next step of the bidiagonalization
        let mut u_next = matrix_times_vector(a, &v);
        u_next.scaled_add(-alpha, &u);
        beta = norm(&u_next);
        if beta > 0.0 {
            u_next /= beta;
        }

        let mut v_next = transposed_times_vector(a, &u_next);
        v_next.scaled_add(-beta, &v);
        alpha = norm(&v_next);
        if alpha > 0.0 {
            v_next /= alpha;
        }

        u = u_next;
        v = v_next;

        // Eliminate the damping term via a first rotation
        let rho_bar_damped = (rho_bar * rho_bar + damp * damp).sqrt();
        let c_damped = rho_bar / rho_bar_damped;
        phi_bar *= c_damped;

        // Second rotation eliminates the subdiagonal of the bidiagonal system
        let rho = (rho_bar_damped * rho_bar_damped + beta * beta).sqrt();
        let c = rho_bar_damped / rho;
        let s = beta / rho;
        let theta = s * alpha;
        rho_bar = -c * alpha;
        let phi = c * phi_bar;
        phi_bar *= s;

        let step = phi / rho;
        x.scaled_add(step, &w);

        w *= -(theta / rho);
        w += &v;

        let negligible_step = step.abs() * norm(&w) <= tolerance * (1.0 + norm(&x));

        if phi_bar <= tolerance * b_norm || beta == 0.0 || alpha == 0.0 || negligible_step {
            break;
        }
    }

    x
}

fn norm(vector: &DenseVector) -> f64 {
    vector.dot(vector).sqrt()
}

fn matrix_times_vector(a: &CsMat<f64>, vector: &DenseVector) -> DenseVector {

    let mut result = Array1::zeros(a.rows());

    for (row, row_entries) in a.outer_iterator().enumerate() {
        let mut sum = 0.0;
        for (column, &value) in row_entries.iter() {
            sum += value * vector[column];
        }
        result[row] = sum;
    }

    result
}

fn transposed_times_vector(a: &CsMat<f64>, vector: &DenseVector) -> DenseVector {

    let mut result = Array1::zeros(a.cols());

    for (row, row_entries) in a.outer_iterator().enumerate() {
        for (column, &value) in row_entries.iter() {
            result[column] += value * vector[row];
        }
    }

    result
}
