//! This crate provides Householder reflector machinery for the QR family of factorizations:
//! generation of elementary reflectors, application of blocks of reflectors in compact-WY form
//! ([`larfb`](larfb::larfb)), and the blocked drivers that build or apply the unitary factor
//! of a factorization without forming the reflectors one by one:
//! - [`ungqr`](ungqr::ungqr) forms the explicit `Q` of a QR factorization,
//! - [`unmlq`](unmlq::unmlq) applies the `Q` of an LQ factorization,
//! - [`unmrq`](unmrq::unmrq) applies the `Q` of an RQ factorization.
//!
//! Every routine that needs scratch memory has a `*_worksize` companion returning a
//! [`WorkInfo`](wy_core::workspace::WorkInfo). Blocked routines take their block size,
//! parallelism and optional scratch buffer through
//! [`BlockedParams`](wy_core::workspace::BlockedParams).
//!
//! # Example
//!
//! ```
//! use assert_approx_eq::assert_approx_eq;
//! use wy_core::{mat, workspace::BlockedParams, Mat};
//! use wy_qr::{factor::geqrf, ungqr::ungqr};
//!
//! let a = mat![
//!     [12.0, -51.0, 4.0],
//!     [6.0, 167.0, -68.0],
//!     [-4.0, 24.0, -41.0],
//!     [1.0, 2.0, 3.0f64],
//! ];
//!
//! // factor A = QR in place
//! let mut qr = a.clone();
//! let mut tau = vec![0.0; 3];
//! geqrf(qr.as_mut(), &mut tau, BlockedParams::default()).unwrap();
//!
//! // form the 4×3 Q explicitly
//! let mut q = qr.clone();
//! ungqr(q.as_mut(), &tau, BlockedParams::default().with_blocksize(2)).unwrap();
//!
//! // Q R == A
//! let r = Mat::from_fn(3, 3, |i, j| if i <= j { qr.read(i, j) } else { 0.0 });
//! let product = q.as_ref() * r.as_ref();
//! for j in 0..3 {
//!     for i in 0..4 {
//!         assert_approx_eq!(product.read(i, j), a.read(i, j), 1e-10);
//!     }
//! }
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

pub mod factor;
pub mod householder;
pub mod larfb;
pub mod ung2r;
pub mod ungqr;
pub mod unmlq;
pub mod unmrq;

#[cfg(test)]
mod test_utils;
