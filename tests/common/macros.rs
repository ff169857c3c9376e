/// Asserts that a value lies in a closed interval.
#[macro_export]
macro_rules! assert_in_range {
    ($value:expr, $lo:expr, $hi:expr) => {
        let v = $value;
        assert!(
            v >= $lo && v <= $hi,
            "{} = {} is not within [{}, {}]",
            stringify!($value),
            v,
            $lo,
            $hi
        );
    };
}

/// Asserts that two floats agree within an absolute tolerance.
#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr, $tol:expr) => {
        let (a, b) = ($a, $b);
        assert!(
            (a - b).abs() <= $tol,
            "{} = {} differs from {} by more than {}",
            stringify!($a),
            a,
            b,
            $tol
        );
    };
}

/// Asserts that an energetics result is a fatal configuration error.
#[macro_export]
macro_rules! assert_misconfigured {
    ($result:expr) => {
        match $result {
            Err(e) => assert_eq!(
                e.kind(),
                larvasim_lib::model::error::ErrorKind::Misconfigured,
                "expected a configuration error, got {e}"
            ),
            Ok(_) => panic!("expected a configuration error"),
        }
    };
}
