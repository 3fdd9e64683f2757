mod prop_decision;
