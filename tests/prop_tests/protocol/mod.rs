mod prop_protocol;
