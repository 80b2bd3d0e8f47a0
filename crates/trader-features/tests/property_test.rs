//! 지표/전처리/분할 속성 테스트
//!
//! 임의 입력에 대해 항상 성립해야 하는 불변식 검증

use chrono::{Duration, TimeZone, Utc};
use ndarray::{Array1, Array2};
use proptest::prelude::*;
use trader_features::indicators::{
    BollingerBandsParams, EmaParams, IndicatorEngine, MacdParams, RsiParams, SmaParams,
};
use trader_features::ml::{
    verify_no_leakage, DataSplitter, OutlierMethod, Preprocessor, PreprocessorConfig, ScalerType,
    SplitConfig,
};

fn prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, 1..120)
}

fn matrix(rows: std::ops::Range<usize>) -> impl Strategy<Value = Array2<f64>> {
    (rows, 1usize..5).prop_flat_map(|(r, c)| {
        prop::collection::vec(-1000.0f64..1000.0, r * c)
            .prop_map(move |v| Array2::from_shape_vec((r, c), v).unwrap())
    })
}

fn no_outlier_config(scaler: ScalerType) -> PreprocessorConfig {
    PreprocessorConfig {
        scaler_type: scaler,
        outlier_method: OutlierMethod::None,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn sma_leading_undefined_and_first_mean(data in prices(), period in 1usize..40) {
        prop_assume!(period <= data.len());
        let sma = IndicatorEngine::new().sma(&data, SmaParams { period });

        prop_assert_eq!(sma.len(), data.len());
        prop_assert_eq!(sma.iter().take_while(|v| v.is_none()).count(), period - 1);
        let mean = data[..period].iter().sum::<f64>() / period as f64;
        prop_assert!((sma[period - 1].unwrap() - mean).abs() < 1e-9);
    }

    #[test]
    fn ema_seed_equals_sma(data in prices(), period in 1usize..40) {
        prop_assume!(period <= data.len());
        let engine = IndicatorEngine::new();
        let ema = engine.ema(&data, EmaParams { period });
        let sma = engine.sma(&data, SmaParams { period });

        prop_assert_eq!(ema[period - 1], sma[period - 1]);
        prop_assert!(ema[..period - 1].iter().all(Option::is_none));
    }

    #[test]
    fn rsi_bounded(data in prices(), period in 1usize..30) {
        let rsi = IndicatorEngine::new().rsi(&data, RsiParams { period });
        for value in rsi.into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn macd_histogram_is_difference(data in prices(), fast in 2usize..10, extra in 1usize..10, signal in 2usize..10) {
        let result = IndicatorEngine::new().macd(
            &data,
            MacdParams { fast_period: fast, slow_period: fast + extra, signal_period: signal },
        );

        for i in 0..data.len() {
            match (result.macd[i], result.signal[i]) {
                (Some(m), Some(s)) => {
                    let h = result.histogram[i].unwrap();
                    prop_assert!((h - (m - s)).abs() < 1e-9);
                }
                _ => {
                    prop_assert!(result.histogram[i].is_none());
                }
            }
        }
    }

    #[test]
    fn bollinger_bands_ordered(data in prices(), period in 1usize..30, k in 0.0f64..4.0) {
        let bb = IndicatorEngine::new().bollinger_bands(
            &data,
            BollingerBandsParams { period, std_dev_multiplier: k },
        );

        for i in 0..data.len() {
            if let (Some(u), Some(m), Some(l)) = (bb.upper[i], bb.middle[i], bb.lower[i]) {
                prop_assert!(u >= m && m >= l);
            }
        }
    }

    #[test]
    fn true_range_non_negative(data in prices(), spread in prop::collection::vec(0.0f64..10.0, 120)) {
        let n = data.len();
        let high: Vec<f64> = data.iter().zip(&spread).map(|(c, s)| c + s).collect();
        let low: Vec<f64> = data.iter().zip(&spread).map(|(c, s)| c - s).collect();
        let tr = IndicatorEngine::new().true_range(&high, &low, &data[..n]).unwrap();

        prop_assert!(tr[0].is_none());
        for value in tr.into_iter().skip(1) {
            prop_assert!(value.unwrap() >= 0.0);
        }
    }

    #[test]
    fn standard_scaled_mean_is_zero(x in matrix(2..60)) {
        let mut pre = Preprocessor::new(no_outlier_config(ScalerType::Standard));
        let out = pre.fit_transform(&x).unwrap();

        for column in out.columns() {
            let mean = column.sum() / column.len() as f64;
            prop_assert!(mean.abs() < 1e-10);
        }
    }

    #[test]
    fn minmax_scaled_in_unit_range(x in matrix(1..60)) {
        let mut pre = Preprocessor::new(no_outlier_config(ScalerType::MinMax));
        let out = pre.fit_transform(&x).unwrap();

        for v in out.iter() {
            prop_assert!(*v >= -1e-12 && *v <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn inverse_transform_restores(x in matrix(1..60), scaler in prop::sample::select(vec![
        ScalerType::Standard, ScalerType::Robust, ScalerType::MinMax, ScalerType::None,
    ])) {
        let mut pre = Preprocessor::new(no_outlier_config(scaler));
        let scaled = pre.fit_transform(&x).unwrap();
        let restored = pre.inverse_transform(&scaled).unwrap();

        for (a, b) in restored.iter().zip(x.iter()) {
            prop_assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn excluded_columns_bitwise_unchanged(x in matrix(1..60)) {
        let last = x.ncols() - 1;
        let mut pre = Preprocessor::new(PreprocessorConfig {
            scaler_type: ScalerType::Standard,
            exclude_from_scaling: vec![last],
            ..Default::default()
        });
        let out = pre.fit_transform(&x).unwrap();

        for (a, b) in out.column(last).iter().zip(x.column(last).iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn split_partitions_cover_input(n in 10usize..300, train in 0.05f64..0.9, val_share in 0.05f64..0.95) {
        let val = (1.0 - train) * val_share;
        let test = 1.0 - train - val;
        prop_assume!(test > 0.0);

        let splitter = DataSplitter::new(SplitConfig { train_ratio: train, val_ratio: val, test_ratio: test }).unwrap();
        let x = Array2::from_shape_fn((n, 1), |(r, _)| r as f64);
        let y = Array1::from_iter((0..n).map(|r| r as f64));
        let split = splitter.split(&x, &y).unwrap();

        prop_assert_eq!(split.train_size() + split.val_size() + split.test_size(), n);
        prop_assert!(split.train_size() >= 1 && split.val_size() >= 1 && split.test_size() >= 1);
        // 단조 증가 열: train 마지막 < val 첫 값 < test 첫 값
        prop_assert!(split.x_train[[split.train_size() - 1, 0]] < split.x_val[[0, 0]]);
        prop_assert!(split.x_val[[0, 0]] < split.x_test[[0, 0]]);
    }

    #[test]
    fn walk_forward_training_windows_grow(n in 20usize..300, n_splits in 2usize..8) {
        let x = Array2::zeros((n, 2));
        let y = Array1::zeros(n);
        let folds = DataSplitter::default().walk_forward_splits(&x, &y, n_splits, None);
        prop_assume!(folds.is_ok());
        let folds = folds.unwrap();

        prop_assert!(!folds.is_empty());
        for pair in folds.windows(2) {
            prop_assert!(pair[0].x_train.nrows() <= pair[1].x_train.nrows());
        }
        for fold in &folds {
            prop_assert!(fold.x_val.nrows() >= 1);
        }
    }
}

#[test]
fn verify_no_leakage_boundaries() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let ts: Vec<_> = (0..100).map(|i| start + Duration::hours(i)).collect();

    assert!(verify_no_leakage(&ts, 49, 50));
    assert!(!verify_no_leakage(&ts, 50, 50));
}
