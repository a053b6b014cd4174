#[cfg(test)]
mod __test__ {

  use crate::attribute::AttributePack;
  use crate::filter::{evaluate, Action, Filter, FnFilter, PassFilter, SeverityFilter};
  use crate::record::Record;

  fn record_with_severity(pack: &AttributePack<'_>, severity: i64) -> Record<'_> {
    Record::new(severity, "x", pack)
  }

  #[test]
  fn test_severity_filter_threshold() {
    let pack = AttributePack::new();
    let filter = SeverityFilter::new(2);

    assert_eq!(
      filter.filter(&record_with_severity(&pack, 1)),
      Action::Deny
    );
    assert_eq!(
      filter.filter(&record_with_severity(&pack, 2)),
      Action::Neutral
    );
    assert_eq!(
      filter.filter(&record_with_severity(&pack, 3)),
      Action::Neutral
    );
  }

  #[test]
  fn test_pass_filter_is_neutral() {
    let pack = AttributePack::new();
    assert_eq!(
      PassFilter.filter(&record_with_severity(&pack, -100)),
      Action::Neutral
    );
  }

  #[test]
  fn test_fn_filter_delegates() {
    let pack = AttributePack::new();
    let filter = FnFilter::new(|record: &Record<'_>| {
      if record.message() == "x" {
        Action::Accept
      } else {
        Action::Deny
      }
    });

    assert_eq!(filter.filter(&record_with_severity(&pack, 0)), Action::Accept);
  }

  #[test]
  fn test_empty_chain_accepts() {
    let pack = AttributePack::new();
    let record = record_with_severity(&pack, 0);

    let filters: [&dyn Filter; 0] = [];
    assert!(evaluate(filters, &record));
  }

  #[test]
  fn test_first_deny_stops_the_chain() {
    let pack = AttributePack::new();
    let record = record_with_severity(&pack, 0);

    let deny = SeverityFilter::new(10);
    let accept = FnFilter::new(|_: &Record<'_>| Action::Accept);
    let filters: [&dyn Filter; 2] = [&deny, &accept];

    assert!(!evaluate(filters, &record));
  }

  #[test]
  fn test_accept_bypasses_later_neutrals_and_denies() {
    let pack = AttributePack::new();
    let record = record_with_severity(&pack, 0);

    let accept = FnFilter::new(|_: &Record<'_>| Action::Accept);
    let deny = SeverityFilter::new(10);
    let filters: [&dyn Filter; 2] = [&accept, &deny];

    assert!(evaluate(filters, &record));
  }

  #[test]
  fn test_all_neutral_chain_accepts() {
    let pack = AttributePack::new();
    let record = record_with_severity(&pack, 5);

    let first = SeverityFilter::new(0);
    let second = PassFilter;
    let filters: [&dyn Filter; 2] = [&first, &second];

    assert!(evaluate(filters, &record));
  }
}
