mod test_offer_answer_relay;
mod test_stale_signals_dropped;
