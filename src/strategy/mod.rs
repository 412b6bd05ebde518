//! Trade evaluation: profit per gp under the Grand Exchange tax rule.

pub mod profit;
