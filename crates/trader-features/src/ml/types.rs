//! ML 모듈의 공통 타입.

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::error::{MlError, MlResult};

/// 이름이 붙은 피처 행렬.
///
/// 행은 시간 오름차순 관측치, 열은 이름이 있는 피처입니다.
/// 생성 후에는 변경되지 않으며, 항상 다음을 만족합니다:
/// - `data.nrows() == timestamps.len()`
/// - `data.ncols() == column_names.len()`
///
/// 역직렬화도 [`FeatureMatrix::new`]를 거치므로 형태가 맞지 않는 입력은 거부됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureMatrix")]
pub struct FeatureMatrix {
    data: Array2<f64>,
    column_names: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
}

/// 검증 전 역직렬화 형태.
#[derive(Deserialize)]
struct RawFeatureMatrix {
    data: Array2<f64>,
    column_names: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
}

impl TryFrom<RawFeatureMatrix> for FeatureMatrix {
    type Error = MlError;

    fn try_from(raw: RawFeatureMatrix) -> MlResult<Self> {
        Self::new(raw.data, raw.column_names, raw.timestamps)
    }
}

impl FeatureMatrix {
    /// 형태를 검증하고 새 피처 행렬을 생성합니다.
    pub fn new(
        data: Array2<f64>,
        column_names: Vec<String>,
        timestamps: Vec<DateTime<Utc>>,
    ) -> MlResult<Self> {
        if data.ncols() != column_names.len() {
            return Err(MlError::ShapeMismatch {
                expected: format!("{} columns", column_names.len()),
                actual: format!("{} columns", data.ncols()),
            });
        }
        if data.nrows() != timestamps.len() {
            return Err(MlError::ShapeMismatch {
                expected: format!("{} rows", timestamps.len()),
                actual: format!("{} rows", data.nrows()),
            });
        }

        Ok(Self {
            data,
            column_names,
            timestamps,
        })
    }

    /// 행(관측치) 수.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// 열(피처) 수.
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// 행이 하나도 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// 이름으로 열 인덱스를 찾습니다.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// 이름으로 열을 조회합니다.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|idx| self.data.column(idx))
    }

    /// 각 셀이 정의된 값(유한)인지 나타내는 마스크.
    ///
    /// 미정의 행을 유지한 빌드 결과에서 피처별 유효 구간을 고를 때 사용합니다.
    pub fn validity_mask(&self) -> Array2<bool> {
        self.data.mapv(f64::is_finite)
    }

    /// 내부 구성 요소를 분해합니다.
    pub fn into_parts(self) -> (Array2<f64>, Vec<String>, Vec<DateTime<Utc>>) {
        (self.data, self.column_names, self.timestamps)
    }
}
