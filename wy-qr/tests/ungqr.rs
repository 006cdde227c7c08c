mod common;

use assert2::assert as fancy_assert;
use common::*;
use wy_core::{
    mat,
    workspace::{GeqrfParams, UngqrParams},
    Mat,
};
use wy_qr::{
    factor::geqrf,
    ungqr::{ungqr, ungqr_worksize},
};

#[test]
fn known_qr_factor() {
    init_logger();

    // QR factorization of [[12, -51, 4], [6, 167, -68], [-4, 24, -41], [1, 2, 3]]
    let mut a = mat![
        [-14.035668847618199, -21.08912679642126, 13.75068064766656],
        [0.23045307708885282, -175.00071065845552, 69.98834522557111],
        [-0.15363538472590188, 0.055617593439617065, 35.24982715294031],
        [0.03840884618147547, 0.009025217582291375, -0.06552307687159747f64],
    ];
    let tau = [1.8549645998549156, 1.9936705520445683, 1.99145015959866];
    let expected = mat![
        [-0.8549645998549156, 0.39445815158726355, -0.33620386452523443],
        [-0.4274822999274579, -0.9027664572285024, 0.0301080357302725],
        [0.2849881999516386, -0.17148588809352908, -0.9338136055495256],
        [-0.07124704998790965, -0.002842628050264851, 0.11854373772307576f64],
    ];

    ungqr(a.as_mut(), &tau, UngqrParams::default().with_blocksize(2)).unwrap();
    fancy_assert!(max_abs_diff(a.as_ref(), expected.as_ref()) < 1e-12);
}

#[test]
fn factor_is_orthonormal_and_reconstructs() {
    init_logger();
    let mut rng = rng();

    for (m, n) in [(12, 8), (8, 8), (20, 5)] {
        let a = random_c64(&mut rng, m, n);
        let mut qr = a.clone();
        let mut tau = vec![Default::default(); n];
        geqrf(qr.as_mut(), &mut tau, GeqrfParams::default().with_blocksize(3)).unwrap();

        let mut q = qr.clone();
        ungqr(q.as_mut(), &tau, UngqrParams::default().with_blocksize(3)).unwrap();
        fancy_assert!(orthogonality_error(q.as_ref()) < 1e-12);

        let r = Mat::from_fn(n, n, |i, j| {
            if i <= j {
                qr.read(i, j)
            } else {
                Default::default()
            }
        });
        let product = q.as_ref() * r.as_ref();
        fancy_assert!(max_abs_diff(product.as_ref(), a.as_ref()) < 1e-12);
    }
}

#[test]
fn block_size_does_not_change_the_result() {
    init_logger();
    let mut rng = rng();

    let (m, n) = (9, 7);
    let mut qr = random_f64(&mut rng, m, n);
    let mut tau = vec![0.0; n];
    geqrf(qr.as_mut(), &mut tau, GeqrfParams::default()).unwrap();

    // all reflectors, and fewer reflectors than columns
    for k in [7, 5] {
        let mut reference = qr.clone();
        ungqr(
            reference.as_mut(),
            &tau[..k],
            UngqrParams::default().with_blocksize(1),
        )
        .unwrap();
        fancy_assert!(orthogonality_error(reference.as_ref()) < 1e-12);

        for nb in [2, 3, k, 64] {
            let mut q = qr.clone();
            ungqr(q.as_mut(), &tau[..k], UngqrParams::default().with_blocksize(nb)).unwrap();
            fancy_assert!(max_abs_diff(q.as_ref(), reference.as_ref()) < 1e-12);
        }
    }
}

#[test]
fn caller_workspace() {
    init_logger();
    let mut rng = rng();

    let (m, n) = (10, 8);
    let mut qr = random_f64(&mut rng, m, n);
    let mut tau = vec![0.0; n];
    geqrf(qr.as_mut(), &mut tau, GeqrfParams::default()).unwrap();

    let mut reference = qr.clone();
    ungqr(reference.as_mut(), &tau, UngqrParams::default().with_blocksize(3)).unwrap();

    let params = UngqrParams::default().with_blocksize(3);
    let size = ungqr_worksize(qr.as_ref(), &tau, &params).size();
    fancy_assert!(size > 0);

    // an exact buffer is used
    let sentinel = 1234.5;
    let mut work = vec![sentinel; size];
    let mut q = qr.clone();
    ungqr(q.as_mut(), &tau, params.with_work(&mut work)).unwrap();
    fancy_assert!(max_abs_diff(q.as_ref(), reference.as_ref()) == 0.0);
    fancy_assert!(work.iter().any(|&x| x != sentinel));

    // a buffer one element short is left alone
    let mut work = vec![f64::NAN; size - 1];
    let mut q = qr.clone();
    ungqr(
        q.as_mut(),
        &tau,
        UngqrParams::default().with_blocksize(3).with_work(&mut work),
    )
    .unwrap();
    fancy_assert!(max_abs_diff(q.as_ref(), reference.as_ref()) == 0.0);
    fancy_assert!(work.iter().all(|x| x.is_nan()));
}

#[test]
fn degenerate_sizes() {
    init_logger();

    // no columns
    let mut a = Mat::<f64>::zeros(5, 0);
    ungqr(a.as_mut(), &[], UngqrParams::default()).unwrap();

    // no reflectors gives the leading columns of the identity
    let mut a = Mat::from_fn(5, 3, |i, j| (i + j) as f64);
    ungqr(a.as_mut(), &[], UngqrParams::default()).unwrap();
    fancy_assert!(a == Mat::identity(5, 3));

    // more reflectors than columns
    let mut a = Mat::<f64>::zeros(5, 2);
    let err = ungqr(a.as_mut(), &[0.0; 3], UngqrParams::default()).unwrap_err();
    fancy_assert!(err.position() == 2);
}
